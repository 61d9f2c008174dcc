use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;

fn parse_env_str(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (idx, line) in content.lines().enumerate() {
        let s = line.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((key, val)) = s.split_once('=') else {
            log::warn!("ignoring .env line {} without '=': {}", idx + 1, line);
            continue;
        };
        let val = val.trim();
        let val = if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            &val[1..val.len() - 1]
        } else {
            val
        };
        map.insert(key.trim().to_string(), val.to_string());
    }
    map
}

/// Entries of `map` whose key is not already set according to `is_set`,
/// sorted by key.
fn unset_entries<'m>(
    map: &'m HashMap<String, String>,
    is_set: impl Fn(&str) -> bool,
) -> Vec<(&'m str, &'m str)> {
    let mut out: Vec<_> = map
        .iter()
        .filter(|(k, _)| !is_set(k.as_str()))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    out.sort_unstable();
    out
}

/// Parse a `.env` style file. A missing file yields an empty map.
pub fn parse_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    Ok(parse_env_str(&fs::read_to_string(path)?))
}

/// Load `path` into the process environment without overriding variables
/// that are already set. Returns the parsed map.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let map = parse_env_file(path)?;
    for (k, v) in unset_entries(&map, |k| std::env::var_os(k).is_some()) {
        // single-threaded: called before clap parsing and the rayon pool
        unsafe {
            std::env::set_var(k, v);
        }
    }
    if !map.is_empty() {
        log::debug!("loaded {} entries from {}", map.len(), path.display());
    }
    Ok(map)
}

pub fn load_dotenv_if_present() -> Result<HashMap<String, String>> {
    load_env_file(Path::new(".env"))
}

/// Write a commented `.env` template listing every household matcher variable.
pub fn write_env_template(path: &Path) -> Result<()> {
    let mut f = fs::File::create(path)?;
    let template = r#"# household_matcher environment configuration template
# Copy this file to .env; any variable can also come from the system environment.
# Command-line flags take precedence over both.

# Number of record partitions used for blocking (>= 1)
#HOUSEHOLD_SPLIT_FACTOR=4

# Weighted-sum acceptance threshold (pairs must score strictly above it)
#HOUSEHOLD_MATCH_THRESHOLD=0.85
# Pairs with address similarity below this are dropped before weighting
#HOUSEHOLD_ADDRESS_PREFILTER=0.95

# Field weights
#HOUSEHOLD_WEIGHT_FAMILY_NAME=0.25
#HOUSEHOLD_WEIGHT_PHONE=0.2
#HOUSEHOLD_WEIGHT_ADDRESS=0.55
#HOUSEHOLD_WEIGHT_ZIP=0.0

# Run blocking batches on all cores
#HOUSEHOLD_PARALLEL=false

# Use the tracing subscriber instead of env_logger (requires the `tracing` feature)
#HOUSEHOLD_MATCHER_TRACING=0
#RUST_LOG=info
"#;
    f.write_all(template.as_bytes())?;
    Ok(())
}
