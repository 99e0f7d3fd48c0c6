use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Construction parameters, loadable from JSON.
///
/// ```json
/// { "entries": 1000000, "error": 0.01 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomConfig {
    pub entries: u32,
    pub error: f64,
}

impl Default for BloomConfig {
    fn default() -> Self {
        Self {
            entries: 1_000_000,
            error: 0.01,
        }
    }
}

impl BloomConfig {
    pub fn new(entries: u32, error: f64) -> Self {
        Self { entries, error }
    }

    /// Parse a JSON config file; missing fields fall back to the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        Self::from_json(&s)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = BloomConfig::from_json(r#"{ "entries": 5000 }"#).unwrap();
        assert_eq!(cfg, BloomConfig::new(5000, 0.01));
    }

    #[test]
    fn load_from_file() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, r#"{{ "entries": 2000, "error": 0.001 }}"#).unwrap();
        let cfg = BloomConfig::load(f.path()).unwrap();
        assert_eq!(cfg, BloomConfig::new(2000, 0.001));
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(BloomConfig::from_json("entries=5").is_err());
        assert!(BloomConfig::load("/no-such-directory/bloom.json").is_err());
    }
}
