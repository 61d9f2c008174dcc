use std::sync::{Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_mb: u64,
    pub used_mb: u64,
    pub avail_mb: u64,
}

static SYS: OnceLock<Mutex<System>> = OnceLock::new();

/// Current system memory in MB. Returns zeros if the sampler is unavailable.
pub fn memory_stats_mb() -> MemoryStats {
    let sys = SYS.get_or_init(|| {
        Mutex::new(System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        ))
    });
    let Ok(mut sys) = sys.lock() else {
        return MemoryStats::default();
    };
    sys.refresh_memory();
    let total_mb = sys.total_memory() / (1024 * 1024);
    let avail_mb = sys.available_memory() / (1024 * 1024);
    MemoryStats {
        total_mb,
        used_mb: total_mb.saturating_sub(avail_mb),
        avail_mb,
    }
}

/// Highest used-memory reading seen across a run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MemoryWatermark {
    pub start_used_mb: u64,
    pub peak_used_mb: u64,
}

impl MemoryWatermark {
    pub fn start() -> Self {
        let m = memory_stats_mb();
        Self {
            start_used_mb: m.used_mb,
            peak_used_mb: m.used_mb,
        }
    }

    pub fn sample(&mut self) -> MemoryStats {
        let m = memory_stats_mb();
        self.observe(m.used_mb);
        m
    }

    /// Fold in a used-memory reading taken elsewhere, e.g. on a worker thread.
    pub fn observe(&mut self, used_mb: u64) {
        self.peak_used_mb = self.peak_used_mb.max(used_mb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn used_never_exceeds_total() {
        let m = memory_stats_mb();
        assert!(m.used_mb <= m.total_mb);
    }

    #[test]
    fn watermark_is_monotonic() {
        let mut w = MemoryWatermark::start();
        let before = w.peak_used_mb;
        w.sample();
        assert!(w.peak_used_mb >= before);
    }

    #[test]
    fn observe_keeps_highest_reading() {
        let mut w = MemoryWatermark {
            start_used_mb: 100,
            peak_used_mb: 100,
        };
        w.observe(250);
        w.observe(180);
        assert_eq!(w.peak_used_mb, 250);
        assert_eq!(w.start_used_mb, 100);
    }
}
