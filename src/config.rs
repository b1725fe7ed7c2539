use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CLSM_EVAL_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub eval: EvalConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Evaluation loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EvalConfig {
    /// Cutoffs reported as Recall@k.
    #[serde(default = "default_recall_intervals")]
    pub recall_intervals: Vec<usize>,
    /// Sigmoid output at or above this is predicted relevant.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Share of the batch count between two progress lines.
    #[serde(default = "default_progress_fraction")]
    pub progress_fraction: f64,
    /// Cutoff shown in progress lines.
    #[serde(default = "default_progress_recall_k")]
    pub progress_recall_k: usize,
    /// Abort once more batches than this have failed; unset means never.
    #[serde(default)]
    pub max_failed_batches: Option<usize>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            recall_intervals: default_recall_intervals(),
            threshold: default_threshold(),
            progress_fraction: default_progress_fraction(),
            progress_recall_k: default_progress_recall_k(),
            max_failed_batches: None,
        }
    }
}

/// Output artifacts configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_write_summary")]
    pub write_summary: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            write_summary: default_write_summary(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_recall_intervals() -> Vec<usize> {
    vec![1, 2, 5, 10, 40, 100, 200, 400]
}

fn default_threshold() -> f32 {
    0.5
}

fn default_progress_fraction() -> f64 {
    0.02
}

fn default_progress_recall_k() -> usize {
    20
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("predicted_labels")
}

fn default_write_summary() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in CLSM_EVAL_CONFIG environment variable (must exist)
    /// 2. ./config.toml in current directory (defaults apply when absent)
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path)),
            Err(_) => {
                let default_path = PathBuf::from("config.toml");
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    let config = Config::default();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    /// Parse and validate a specific config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.eval.recall_intervals.is_empty() {
            anyhow::bail!("eval.recall_intervals must not be empty");
        }

        if self.eval.threshold <= 0.0 || self.eval.threshold >= 1.0 {
            anyhow::bail!("eval.threshold must be between 0.0 and 1.0 (exclusive)");
        }

        if self.eval.progress_fraction <= 0.0 || self.eval.progress_fraction > 1.0 {
            anyhow::bail!("eval.progress_fraction must be in (0.0, 1.0]");
        }

        if self.eval.progress_recall_k == 0 {
            anyhow::bail!("eval.progress_recall_k must be greater than 0");
        }

        Ok(())
    }

    /// Recall cutoffs, sorted and deduplicated for reporting.
    pub fn recall_intervals(&self) -> Vec<usize> {
        let mut ks = self.eval.recall_intervals.clone();
        ks.sort_unstable();
        ks.dedup();
        ks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serialize config tests that mutate process-wide cwd and env so they don't race.
    static CONFIG_TEST_LOCK: Mutex<()> = Mutex::new(());

    const TEST_CONFIG: &str = r#"
[eval]
recall_intervals = [10, 1, 5, 5]
threshold = 0.6
progress_fraction = 0.1
max_failed_batches = 2

[output]
dir = "out"
write_summary = false

[logging]
level = "debug"
"#;

    /// Restores cwd when dropped (e.g. on panic).
    struct CwdGuard(PathBuf);
    impl Drop for CwdGuard {
        fn drop(&mut self) {
            let _ = std::env::set_current_dir(&self.0);
        }
    }

    fn with_config_env(config_path: Option<&Path>, f: impl FnOnce()) {
        let original = std::env::var(CONFIG_ENV).ok();
        match config_path {
            Some(p) => std::env::set_var(CONFIG_ENV, p),
            None => std::env::remove_var(CONFIG_ENV),
        }
        f();
        std::env::remove_var(CONFIG_ENV);
        if let Some(val) = original {
            std::env::set_var(CONFIG_ENV, val);
        }
    }

    #[test]
    fn test_config_load_from_env_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("eval.toml");
        fs::write(&config_path, TEST_CONFIG).unwrap();
        with_config_env(Some(config_path.as_path()), || {
            let config = Config::load();
            assert!(config.is_ok(), "Config::load() failed: {:?}", config.err());
            let config = config.unwrap();
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.eval.max_failed_batches, Some(2));
            assert_eq!(config.output.dir, PathBuf::from("out"));
            assert!(!config.output.write_summary);
            assert_eq!(config.recall_intervals(), vec![1, 5, 10]);
        });
    }

    #[test]
    fn test_config_defaults_without_file() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        let temp_dir = TempDir::new().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let _cwd = CwdGuard(original_dir);
        std::env::set_current_dir(temp_dir.path()).unwrap();
        with_config_env(None, || {
            let config = Config::load().unwrap();
            assert_eq!(config.eval.recall_intervals, vec![1, 2, 5, 10, 40, 100, 200, 400]);
            assert_eq!(config.eval.threshold, 0.5);
            assert_eq!(config.eval.progress_recall_k, 20);
            assert_eq!(config.output.dir, PathBuf::from("predicted_labels"));
            assert_eq!(config.logging.level, "info");
        });
    }

    #[test]
    fn test_config_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[output]\ndir = \"elsewhere\"\n").unwrap();
        let config = Config::from_file(&config_path).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("elsewhere"));
        assert!(config.output.write_summary);
        assert_eq!(config.eval.progress_fraction, 0.02);
    }

    #[test]
    fn test_config_rejects_bad_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[eval]\nthreshold = 1.5\n").unwrap();
        let err = Config::from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }

    #[test]
    fn test_config_rejects_empty_intervals() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "[eval]\nrecall_intervals = []\n").unwrap();
        assert!(Config::from_file(&config_path).is_err());
    }

    #[test]
    fn test_config_invalid_path() {
        let _lock = CONFIG_TEST_LOCK.lock().unwrap();
        with_config_env(Some(Path::new("nonexistent.toml")), || {
            let config = Config::load();
            assert!(config.is_err());
        });
    }
}
