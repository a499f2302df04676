use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings for a [`Cache`](crate::Cache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one file per cache entry.
    pub dir: PathBuf,
    /// Gzip entry bodies.
    pub compress: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("checkpoints"),
            compress: true,
        }
    }
}

impl CacheConfig {
    /// Read a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("[cache::config] Failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("[cache::config] Failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::CacheConfig;

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{ "dir": "/tmp/oregon" }"#).unwrap();

        let config = CacheConfig::from_json_file(&path).unwrap();
        assert_eq!(config.dir, PathBuf::from("/tmp/oregon"));
        assert!(config.compress);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "dir = 3").unwrap();
        assert!(CacheConfig::from_json_file(&path).is_err());
        assert!(CacheConfig::from_json_file(&dir.path().join("absent.json")).is_err());
    }
}
