use std::ops::Range;

/// A contiguous slice of record positions processed as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub range: Range<usize>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Split `range` into `parts` contiguous pieces whose lengths differ by at
/// most one, larger pieces first. Empty pieces are omitted, so fewer than
/// `parts` ranges come back when the range is shorter than `parts`.
pub fn split_even(range: Range<usize>, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let len = range.len();
    let base = len / parts;
    let extra = len % parts;
    let mut out = Vec::with_capacity(parts.min(len));
    let mut start = range.start;
    for i in 0..parts {
        let size = base + usize::from(i < extra);
        if size == 0 {
            break;
        }
        out.push(start..start + size);
        start += size;
    }
    out
}

/// Top-level blocking partitions over `[0, n)`.
pub fn record_partitions(n: usize, split_factor: usize) -> Vec<Partition> {
    split_even(0..n, split_factor)
        .into_iter()
        .enumerate()
        .map(|(i, range)| Partition {
            name: format!("part_{}", i),
            range,
        })
        .collect()
}

/// Sub-split of the forward suffix `[a.start, n)` into pieces roughly the
/// size of `a`: `max(1, floor(suffix_len / a_len))` pieces.
pub fn forward_chunks(a: &Range<usize>, n: usize) -> Vec<Range<usize>> {
    if a.is_empty() || a.start >= n {
        return Vec::new();
    }
    let suffix = a.start..n;
    let sub_split = (suffix.len() / a.len()).max(1);
    split_even(suffix, sub_split)
}
