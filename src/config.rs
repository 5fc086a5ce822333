//! Configuration for memovox paths and backend.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (MEMOVOX_HOME, MEMOVOX_BACKEND_URL)
//! 2. Config file ($MEMOVOX_HOME/config.yaml)
//! 3. Defaults (~/.memovox, hosted backend)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::notes::RetryPolicy;

/// Default transcription backend
const DEFAULT_BACKEND_URL: &str = "https://backend-jdue.onrender.com";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Transcription backend base URL
    pub backend_url: Option<String>,

    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetryConfig {
    /// Maximum automatic attempts before a note fails terminally
    pub max_attempts: Option<u32>,

    /// Backoff table in milliseconds, last entry repeats
    pub delays_ms: Option<Vec<u64>>,

    /// Pause between sequential attempts during a queue drain
    pub queue_gap_ms: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to memovox home (stored notes + settings)
    pub home: PathBuf,

    /// Transcription backend base URL
    pub backend_url: String,

    /// Retry behavior for the transcription queue
    pub retry: RetryPolicy,

    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".memovox");

    let home = std::env::var("MEMOVOX_HOME")
        .map(PathBuf::from)
        .unwrap_or(default_home);

    // Optional config file inside the home directory
    let config_path = home.join("config.yaml");
    let (file, config_file) = if config_path.exists() {
        (load_config_file(&config_path)?, Some(config_path))
    } else {
        (ConfigFile::default(), None)
    };

    let backend_url = std::env::var("MEMOVOX_BACKEND_URL")
        .ok()
        .or(file.backend_url)
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

    let mut retry = RetryPolicy::default();
    if let Some(rc) = file.retry {
        if let Some(max) = rc.max_attempts {
            retry.max_attempts = max;
        }
        if let Some(delays) = rc.delays_ms {
            if !delays.is_empty() {
                retry.delays = delays.into_iter().map(Duration::from_millis).collect();
            }
        }
        if let Some(gap) = rc.queue_gap_ms {
            retry.queue_gap = Duration::from_millis(gap);
        }
    }

    Ok(ResolvedConfig {
        home,
        backend_url,
        retry,
        config_file,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Get the memovox home directory (stored notes + settings)
pub fn memovox_home() -> Result<PathBuf> {
    Ok(config()?.home.clone())
}

/// Get the transcription backend base URL
pub fn backend_url() -> Result<String> {
    Ok(config()?.backend_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
backend_url: "http://localhost:3000"
retry:
  max_attempts: 5
  delays_ms: [1000, 2000]
  queue_gap_ms: 100
"#
        )
        .unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(
            config.backend_url.as_deref(),
            Some("http://localhost:3000")
        );

        let retry = config.retry.unwrap();
        assert_eq!(retry.max_attempts, Some(5));
        assert_eq!(retry.delays_ms, Some(vec![1000, 2000]));
        assert_eq!(retry.queue_gap_ms, Some(100));
    }

    #[test]
    fn test_empty_config_file_uses_defaults() {
        let file: ConfigFile = serde_yaml::from_str("{}").unwrap();
        assert!(file.backend_url.is_none());
        assert!(file.retry.is_none());
    }
}
