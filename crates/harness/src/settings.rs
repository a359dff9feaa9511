//! Harness settings
//!
//! Resolution order (later wins):
//! 1. built-in defaults
//! 2. the file named by `CLUSTERTEST_CONFIG` (any format `config` understands)
//! 3. `CLUSTERTEST_*` environment variables, e.g. `CLUSTERTEST_WORKSPACE_DIR`

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use clustertest_core::application::constants::{
    DEFAULT_CLUSTER_PREFIX, DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};
use clustertest_core::application::{HardwareConfig, PollPolicy};
use clustertest_core::{HarnessError, Result};

/// Environment variable naming an optional settings file
pub const CONFIG_FILE_ENV: &str = "CLUSTERTEST_CONFIG";

const ENV_PREFIX: &str = "CLUSTERTEST";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Parent of every per-cluster working directory
    pub workspace_dir: PathBuf,
    pub cluster_prefix: String,
    pub poll_attempts: u32,
    pub poll_interval_secs: u64,
}

impl Settings {
    /// Load settings from defaults, the optional file and the process environment
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        Self::load_from(file, None)
    }

    /// Load with an explicit file and, for tests, an explicit environment map
    ///
    /// `env` replaces the process environment as the source of
    /// `CLUSTERTEST_*` overrides when given.
    pub fn load_from(
        file: Option<PathBuf>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default(
                "workspace_dir",
                default_workspace_dir().to_string_lossy().into_owned(),
            )
            .and_then(|b| b.set_default("cluster_prefix", DEFAULT_CLUSTER_PREFIX))
            .and_then(|b| b.set_default("poll_attempts", i64::from(DEFAULT_POLL_ATTEMPTS)))
            .and_then(|b| {
                b.set_default("poll_interval_secs", DEFAULT_POLL_INTERVAL.as_secs() as i64)
            })
            .map_err(config_error)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.poll_attempts,
            Duration::from_secs(self.poll_interval_secs),
        )
    }

    pub fn hardware_config(&self) -> HardwareConfig {
        HardwareConfig::new(&self.workspace_dir).cluster_prefix(&self.cluster_prefix)
    }
}

/// User cache dir (`.../clustertest`), falling back to the system temp dir
pub fn default_workspace_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "clustertest")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("clustertest"))
}

fn config_error(e: config::ConfigError) -> HarnessError {
    HarnessError::Config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_from(None, env(&[])).unwrap();

        assert_eq!(settings.workspace_dir, default_workspace_dir());
        assert_eq!(settings.cluster_prefix, "clustertest-");
        assert_eq!(settings.poll_policy(), PollPolicy::default());
    }

    #[test]
    fn test_env_overrides() {
        let settings = Settings::load_from(
            None,
            env(&[
                ("CLUSTERTEST_WORKSPACE_DIR", "/srv/ci"),
                ("CLUSTERTEST_CLUSTER_PREFIX", "ci-"),
                ("CLUSTERTEST_POLL_ATTEMPTS", "3"),
                ("CLUSTERTEST_POLL_INTERVAL_SECS", "1"),
            ]),
        )
        .unwrap();

        assert_eq!(settings.workspace_dir, PathBuf::from("/srv/ci"));
        assert_eq!(settings.cluster_prefix, "ci-");
        assert_eq!(settings.poll_policy(), PollPolicy::new(3, Duration::from_secs(1)));

        let hw = settings.hardware_config();
        assert_eq!(hw.workspace_dir, PathBuf::from("/srv/ci"));
        assert_eq!(hw.cluster_prefix, "ci-");
    }

    #[test]
    fn test_file_then_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clustertest.toml");
        std::fs::write(
            &path,
            "cluster_prefix = \"file-\"\npoll_attempts = 7\n",
        )
        .unwrap();

        let settings = Settings::load_from(
            Some(path),
            env(&[("CLUSTERTEST_POLL_ATTEMPTS", "9")]),
        )
        .unwrap();

        assert_eq!(settings.cluster_prefix, "file-");
        assert_eq!(settings.poll_attempts, 9);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Settings::load_from(Some(PathBuf::from("/nonexistent/ct.toml")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let err = Settings::load_from(None, env(&[("CLUSTERTEST_POLL_ATTEMPTS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Config(_)));
    }
}
