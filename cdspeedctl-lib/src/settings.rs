//! Process-wide defaults.
//!
//! A single [`Settings`] value is built once by the caller and handed to the
//! controller, so nothing below this module hard-codes paths or delays.

use std::time::Duration;

pub const DEFAULT_DEVICE: &str = "/dev/sr0";
pub const DEFAULT_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_secs(1);
pub const SG_TIMEOUT: Duration = Duration::from_secs(5);
pub const SENSE_BUFFER_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Block device used when none is given.
    pub default_device: String,
    /// Set attempts when the caller leaves the retry budget unset.
    pub default_retries: u32,
    /// Pause between two set attempts.
    pub retry_delay: Duration,
    /// Pause between two readiness probes.
    pub ready_poll_interval: Duration,
    /// Timeout handed to the SCSI pass-through driver.
    pub sg_timeout: Duration,
    pub sense_buffer_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_device: DEFAULT_DEVICE.to_string(),
            default_retries: DEFAULT_RETRIES,
            retry_delay: RETRY_DELAY,
            ready_poll_interval: RETRY_DELAY,
            sg_timeout: SG_TIMEOUT,
            sense_buffer_len: SENSE_BUFFER_LEN,
        }
    }
}

impl Settings {
    /// Number of set attempts for a user supplied retry value.
    ///
    /// `None` means the flag was not given and yields the default budget.
    /// An explicit `0` means a single attempt without retries.
    pub fn attempts_for(&self, retry: Option<u32>) -> u32 {
        match retry {
            None => self.default_retries,
            Some(0) => 1,
            Some(n) => n,
        }
    }

    /// Seconds to wait for the device before the first attempt.
    pub fn ready_secs_for(&self, retry: Option<u32>) -> u32 {
        retry.unwrap_or(0)
    }
}
