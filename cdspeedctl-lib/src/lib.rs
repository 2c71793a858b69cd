//! Optical drive read speed control.
//!
//! The speed is changed through the native cdrom ioctl on the block device,
//! falling back to an MMC SET CD SPEED command over the generic SCSI driver
//! when one is configured. See [`SpeedController`] for the retry policy.

pub mod cdrom;
pub mod command;
pub mod controller;
pub mod error;
pub mod progress;
pub mod ready;
pub mod sense;
pub mod settings;
pub mod sg;
pub mod speed;

pub use controller::{AttemptResult, SetOutcome, SpeedController, SpeedRequest};
pub use error::{Error, InterfaceFailure, Result};
pub use settings::Settings;
pub use speed::{FallbackPath, PrimaryPath, ReadinessProbe, SpeedReader, SpeedSetter, Strategy};
