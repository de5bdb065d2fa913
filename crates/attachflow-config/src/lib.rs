pub mod error;

pub use error::*;

use attachflow_cloud::{PollConfig, Tags, Timeouts};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "ATTACHFLOW_CONFIG_PATH";

/// Settings file contents. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Region the Network Manager API is called in
    pub region: String,

    /// Tags merged into every created attachment
    pub default_tags: Tags,

    pub timeouts: TimeoutSettings,

    pub poll: PollSettings,

    /// Consecutive not-found reads before a delete counts as complete
    pub not_found_checks: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: "us-west-2".to_string(),
            default_tags: Tags::new(),
            timeouts: TimeoutSettings::default(),
            poll: PollSettings::default(),
            not_found_checks: 1,
        }
    }
}

/// Wait timeouts in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
    pub create: u64,
    pub delete: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        let secs = Timeouts::DEFAULT.as_secs();
        Self {
            create: secs,
            delete: secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for PollSettings {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            initial_delay_ms: poll.initial_delay.as_millis() as u64,
            max_delay_ms: poll.max_delay.as_millis() as u64,
            multiplier: poll.multiplier,
        }
    }
}

impl Settings {
    /// Reject values the lifecycle cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".into()));
        }
        for (name, secs) in [
            ("timeouts.create", self.timeouts.create),
            ("timeouts.delete", self.timeouts.delete),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }
        if self.poll.initial_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll.initial_delay_ms must be positive".into(),
            ));
        }
        if self.poll.max_delay_ms < self.poll.initial_delay_ms {
            return Err(ConfigError::Invalid(
                "poll.max_delay_ms must not be below poll.initial_delay_ms".into(),
            ));
        }
        if !self.poll.multiplier.is_finite() || self.poll.multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "poll.multiplier must be a finite number of at least 1.0".into(),
            ));
        }
        if self.not_found_checks == 0 {
            return Err(ConfigError::Invalid(
                "not_found_checks must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            create: Duration::from_secs(self.timeouts.create),
            delete: Duration::from_secs(self.timeouts.delete),
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            initial_delay: Duration::from_millis(self.poll.initial_delay_ms),
            max_delay: Duration::from_millis(self.poll.max_delay_ms),
            multiplier: self.poll.multiplier,
        }
    }
}

/// AttachFlow's config directory (`<config_dir>/attachflow`)
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("attachflow"))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// Find the settings file
///
/// Search order:
/// 1. `ATTACHFLOW_CONFIG_PATH` (direct path)
/// 2. current directory: `attachflow.yaml`, then `.attachflow/config.yaml`
/// 3. `~/.config/attachflow/config.yaml` (global)
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "{} points to {}, which does not exist",
            CONFIG_PATH_ENV,
            path.display()
        );
    }

    let current_dir = std::env::current_dir()?;
    for candidate in [
        current_dir.join("attachflow.yaml"),
        current_dir.join(".attachflow").join("config.yaml"),
    ] {
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Load and validate settings from `path`
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = if content.trim().is_empty() {
        Settings::default()
    } else {
        serde_yaml::from_str(&content)?
    };
    settings.validate()?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings from the first file found, or defaults when there is none
pub fn load_settings() -> Result<Settings> {
    match find_config_file() {
        Ok(path) => load_settings_from(&path),
        Err(ConfigError::ConfigFileNotFound) => {
            tracing::debug!("No settings file found, using defaults");
            Ok(Settings::default())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    /// Run `f` inside `dir` with no env override and an empty global config dir
    fn in_dir<F: FnOnce()>(dir: &Path, f: F) {
        let original_dir = std::env::current_dir().unwrap();
        let xdg = tempfile::tempdir().unwrap();
        std::env::set_current_dir(dir).unwrap();

        temp_env::with_vars(
            [
                (CONFIG_PATH_ENV, None),
                ("XDG_CONFIG_HOME", Some(xdg.path().as_os_str())),
            ],
            f,
        );

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.timeouts().create, Duration::from_secs(600));
        assert_eq!(settings.poll_config(), PollConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings = serde_yaml::from_str(
            r#"
region: eu-central-1
timeouts:
  delete: 120
default_tags:
  team: net
"#,
        )
        .unwrap();

        assert_eq!(settings.region, "eu-central-1");
        assert_eq!(settings.timeouts.delete, 120);
        assert_eq!(settings.timeouts.create, 600);
        assert_eq!(settings.default_tags["team"], "net");
        assert_eq!(settings.not_found_checks, 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.timeouts.create = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.poll.multiplier = 0.5;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        for multiplier in [f64::INFINITY, f64::NAN] {
            let mut settings = Settings::default();
            settings.poll.multiplier = multiplier;
            assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
        }

        let mut settings = Settings::default();
        settings.poll.max_delay_ms = 10;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        let mut settings = Settings::default();
        settings.not_found_checks = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_multiplier_edges_from_file() {
        let settings: Settings = serde_yaml::from_str("poll:\n  multiplier: .inf\n").unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));

        // Large but finite multipliers are accepted; delays stay capped at max_delay_ms
        let settings: Settings = serde_yaml::from_str("poll:\n  multiplier: 1e300\n").unwrap();
        assert!(settings.validate().is_ok());
        let poll = settings.poll_config();
        assert_eq!(poll.delay_for_attempt(u32::MAX), poll.max_delay);
    }

    #[test]
    fn test_removed_update_timeout_is_rejected() {
        let result: std::result::Result<Settings, _> =
            serde_yaml::from_str("timeouts:\n  update: 60\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_settings_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("attachflow.yaml");
        fs::write(
            &path,
            "poll:\n  initial_delay_ms: 500\n  max_delay_ms: 2000\nnot_found_checks: 3\n",
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.poll_config().initial_delay, Duration::from_millis(500));
        assert_eq!(settings.poll_config().max_delay, Duration::from_millis(2000));
        assert_eq!(settings.not_found_checks, 3);
    }

    #[test]
    fn test_empty_file_is_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("attachflow.yaml");
        fs::write(&path, "").unwrap();

        assert_eq!(load_settings_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("attachflow.yaml");
        fs::write(&path, "timeouts:\n  create: 0\n").unwrap();

        assert!(matches!(
            load_settings_from(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("attachflow.yaml"), "region: us-west-2\n").unwrap();

        in_dir(temp_dir.path(), || {
            let result = find_config_file().unwrap();
            assert!(result.ends_with("attachflow.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_in_dot_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dot_dir = temp_dir.path().join(".attachflow");
        fs::create_dir(&dot_dir).unwrap();
        fs::write(dot_dir.join("config.yaml"), "region: us-west-2\n").unwrap();

        in_dir(temp_dir.path(), || {
            let result = find_config_file().unwrap();
            assert!(result.ends_with(".attachflow/config.yaml"));
        });
    }

    #[test]
    #[serial]
    fn test_find_config_file_env_var() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "region: ap-northeast-1\n").unwrap();

        temp_env::with_var(CONFIG_PATH_ENV, Some(config_path.as_os_str()), || {
            assert_eq!(find_config_file().unwrap(), config_path);
            assert_eq!(load_settings().unwrap().region, "ap-northeast-1");
        });
    }

    #[test]
    #[serial]
    fn test_missing_file_falls_back_to_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();

        in_dir(temp_dir.path(), || {
            assert!(matches!(
                find_config_file(),
                Err(ConfigError::ConfigFileNotFound)
            ));
            assert_eq!(load_settings().unwrap(), Settings::default());
        });
    }
}
