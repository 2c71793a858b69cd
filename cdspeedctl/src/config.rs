use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Default flag values used when neither the command line nor the config
/// file provides one. The device default lives in the library `Settings`.
pub struct Defaults;

impl Defaults {
    pub const QUIET: bool = false;
    pub const VERBOSE: bool = false;
}

/// Root of the JSON configuration file. Every field is optional.
///
/// ```json
/// { "device": "/dev/sr1", "sg": "/dev/sg1", "speed": 4, "retry": 2 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CdSpeedConfig {
    pub device: Option<String>,
    pub sg: Option<String>,
    pub speed: Option<u16>,
    pub retry: Option<u32>,
    #[serde(default)]
    pub quiet: bool,
    #[serde(default)]
    pub verbose: bool,
}

impl CdSpeedConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        let config: CdSpeedConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_defaults() -> Self {
        Self {
            device: None,
            sg: None,
            speed: None,
            retry: None,
            quiet: Defaults::QUIET,
            verbose: Defaults::VERBOSE,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.device.as_deref().is_some_and(str::is_empty) {
            bail!("Config: device must not be empty");
        }
        if self.sg.as_deref().is_some_and(str::is_empty) {
            bail!("Config: sg must not be empty when given");
        }
        if self.speed == Some(0) {
            bail!("Config: speed must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let file = write_config(r#"{ "speed": 4 }"#);
        let config = CdSpeedConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            config,
            CdSpeedConfig {
                speed: Some(4),
                ..CdSpeedConfig::with_defaults()
            }
        );
    }

    #[test]
    fn full_config_is_read() {
        let file = write_config(
            r#"{ "device": "/dev/sr1", "sg": "/dev/sg1", "speed": 8, "retry": 2, "quiet": true }"#,
        );
        let config = CdSpeedConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.device.as_deref(), Some("/dev/sr1"));
        assert_eq!(config.sg.as_deref(), Some("/dev/sg1"));
        assert_eq!(config.speed, Some(8));
        assert_eq!(config.retry, Some(2));
        assert!(config.quiet);
        assert!(!config.verbose);
    }

    #[test]
    fn zero_speed_and_unknown_keys_are_rejected() {
        let zero = write_config(r#"{ "speed": 0 }"#);
        assert!(CdSpeedConfig::from_file(zero.path().to_str().unwrap()).is_err());

        let empty_device = write_config(r#"{ "device": "" }"#);
        assert!(CdSpeedConfig::from_file(empty_device.path().to_str().unwrap()).is_err());

        let unknown = write_config(r#"{ "sped": 4 }"#);
        assert!(CdSpeedConfig::from_file(unknown.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(CdSpeedConfig::from_file("/nonexistent/cdspeedctl.json").is_err());
    }
}
