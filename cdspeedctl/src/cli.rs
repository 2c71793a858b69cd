use anyhow::{Result, bail};
use cdspeedctl_lib::Settings;
use clap::Parser;

use crate::config::CdSpeedConfig;

/// Effective options after merging the command line over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub device: String,
    pub sg: Option<String>,
    pub speed: Option<u16>,
    pub retry: Option<u32>,
    pub quiet: bool,
    pub verbose: bool,
    pub current: bool,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "CD-ROM speed control", long_about = None)]
pub struct Cli {
    /// JSON configuration file path
    #[arg(short = 'f', long = "config")]
    pub config: Option<String>,

    /// CD-ROM device (default: /dev/sr0)
    #[arg(short = 'd', long = "device")]
    pub device: Option<String>,

    /// Speed (e.g., 1, 2, 4)
    #[arg(short = 's', long = "speed")]
    pub speed: Option<u16>,

    /// Optional SG device for fallback (e.g., /dev/sg1)
    #[arg(short = 'g', long = "sg")]
    pub sg: Option<String>,

    /// Seconds to wait for the device, also the number of set attempts
    /// (default: no wait, 3 attempts; 0 means a single attempt)
    #[arg(short = 'r', long = "retry")]
    pub retry: Option<u32>,

    /// Suppress output except fatal errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Get the current speed of the CD-ROM drive
    #[arg(short = 'c', long = "current")]
    pub current: bool,
}

/// Merge CLI arguments with configuration file, CLI args take precedence.
/// The device falls back to `settings.default_device`.
pub fn merge_config(
    args: &Cli,
    config: Option<CdSpeedConfig>,
    settings: &Settings,
) -> Result<MergedConfig> {
    let base_config = config.unwrap_or_else(CdSpeedConfig::with_defaults);

    let device = args
        .device
        .clone()
        .or(base_config.device)
        .unwrap_or_else(|| settings.default_device.clone());
    if device.is_empty() {
        bail!("Device must not be empty");
    }
    let sg = args.sg.clone().or(base_config.sg);
    if sg.as_deref().is_some_and(str::is_empty) {
        bail!("SG device must not be empty");
    }

    Ok(MergedConfig {
        device,
        sg,
        speed: args.speed.or(base_config.speed),
        retry: args.retry.or(base_config.retry),
        quiet: args.quiet || base_config.quiet,
        verbose: args.verbose || base_config.verbose,
        current: args.current,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("cdspeedctl").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_and_long_flags_parse() {
        let short = parse(&["-d", "/dev/sr1", "-s", "4", "-g", "/dev/sg1", "-r", "2", "-q", "-v", "-c"]);
        let long = parse(&[
            "--device", "/dev/sr1", "--speed", "4", "--sg", "/dev/sg1", "--retry", "2", "--quiet",
            "--verbose", "--current",
        ]);
        for args in [short, long] {
            let merged = merge_config(&args, None, &Settings::default()).unwrap();
            assert_eq!(
                merged,
                MergedConfig {
                    device: "/dev/sr1".to_string(),
                    sg: Some("/dev/sg1".to_string()),
                    speed: Some(4),
                    retry: Some(2),
                    quiet: true,
                    verbose: true,
                    current: true,
                }
            );
        }
    }

    #[test]
    fn defaults_without_flags() {
        let merged = merge_config(&parse(&[]), None, &Settings::default()).unwrap();
        assert_eq!(merged.device, "/dev/sr0");
        assert_eq!(merged.sg, None);
        assert_eq!(merged.speed, None);
        assert_eq!(merged.retry, None);
        assert!(!merged.quiet && !merged.verbose && !merged.current);
    }

    #[test]
    fn cli_overrides_config_file() {
        let config = CdSpeedConfig {
            device: Some("/dev/sr1".to_string()),
            sg: Some("/dev/sg1".to_string()),
            speed: Some(8),
            retry: Some(5),
            quiet: false,
            verbose: true,
        };
        let args = parse(&["-s", "2", "-d", "/dev/sr2"]);
        let merged = merge_config(&args, Some(config), &Settings::default()).unwrap();
        assert_eq!(merged.device, "/dev/sr2");
        assert_eq!(merged.sg.as_deref(), Some("/dev/sg1"));
        assert_eq!(merged.speed, Some(2));
        assert_eq!(merged.retry, Some(5));
        assert!(merged.verbose);
    }

    #[test]
    fn device_falls_back_to_settings() {
        let settings = Settings {
            default_device: "/dev/sr3".to_string(),
            ..Settings::default()
        };
        let merged = merge_config(&parse(&[]), None, &settings).unwrap();
        assert_eq!(merged.device, "/dev/sr3");

        // A config file without a device does not reintroduce /dev/sr0.
        let config = CdSpeedConfig {
            speed: Some(4),
            ..CdSpeedConfig::with_defaults()
        };
        let merged = merge_config(&parse(&[]), Some(config), &settings).unwrap();
        assert_eq!(merged.device, "/dev/sr3");

        let merged = merge_config(&parse(&["-d", "/dev/sr1"]), None, &settings).unwrap();
        assert_eq!(merged.device, "/dev/sr1");
    }

    #[test]
    fn negative_or_oversized_speed_does_not_parse() {
        let argv = |speed: &'static str| ["cdspeedctl", "--speed", speed];
        assert!(Cli::try_parse_from(argv("-1")).is_err());
        assert!(Cli::try_parse_from(argv("70000")).is_err());
        assert!(Cli::try_parse_from(argv("abc")).is_err());
    }

    #[test]
    fn empty_sg_is_rejected() {
        assert!(merge_config(&parse(&["--sg", ""]), None, &Settings::default()).is_err());
    }
}
