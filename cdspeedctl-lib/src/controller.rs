//! Retry/fallback orchestration.
//!
//! Each iteration tries the primary path first and the fallback path second
//! when one is configured. The loop stops at the first success; otherwise it
//! pauses for the retry delay and tries again until the attempt budget is
//! spent. A successful run ends with one best-effort read-back of the speed.

use crate::error::{Error, Result};
use crate::progress::{ProgressCallbackArc, ProgressHelper};
use crate::ready;
use crate::settings::{DEFAULT_RETRIES, Settings};
use crate::speed::{FallbackPath, PrimaryPath, SpeedReader, SpeedSetter, Strategy};
use strum::Display;

/// A validated request to change the read speed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedRequest {
    device_path: String,
    fallback_path: Option<String>,
    target_speed: u16,
    ready_secs: u32,
    max_retries: u32,
    verbose: bool,
}

impl SpeedRequest {
    /// Speed `0` is rejected; every other value is passed to the drive as is.
    pub fn new(device_path: impl Into<String>, target_speed: u16) -> Result<Self> {
        if target_speed == 0 {
            return Err(Error::invalid_argument("--speed must be specified and > 0"));
        }
        let device_path = device_path.into();
        if device_path.is_empty() {
            return Err(Error::invalid_argument("device path must not be empty"));
        }
        Ok(Self {
            device_path,
            fallback_path: None,
            target_speed,
            ready_secs: 0,
            max_retries: DEFAULT_RETRIES,
            verbose: false,
        })
    }

    pub fn with_fallback(mut self, fallback_path: Option<String>) -> Self {
        self.fallback_path = fallback_path.filter(|p| !p.is_empty());
        self
    }

    /// Apply the user's `--retry` value; see [`Settings::attempts_for`].
    pub fn with_retry(mut self, retry: Option<u32>, settings: &Settings) -> Self {
        self.ready_secs = settings.ready_secs_for(retry);
        self.max_retries = settings.attempts_for(retry);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn fallback_path(&self) -> Option<&str> {
        self.fallback_path.as_deref()
    }

    pub fn target_speed(&self) -> u16 {
        self.target_speed
    }

    pub fn ready_secs(&self) -> u32 {
        self.ready_secs
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Outcome of a single loop iteration.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    #[strum(to_string = "speed set")]
    Success,
    #[strum(to_string = "ioctl failed")]
    PrimaryFailed,
    #[strum(to_string = "SG_IO failed")]
    FallbackFailed,
    #[strum(to_string = "ioctl and SG_IO failed")]
    BothFailed,
}

impl AttemptResult {
    /// Combine the results of the paths tried in one iteration, `None`
    /// meaning the path was not tried.
    pub fn classify(primary: Option<bool>, fallback: Option<bool>) -> Self {
        match (primary, fallback) {
            (Some(true), _) | (_, Some(true)) => Self::Success,
            (Some(false), Some(false)) => Self::BothFailed,
            (None, Some(false)) => Self::FallbackFailed,
            (_, None) => Self::PrimaryFailed,
        }
    }
}

/// What a successful set looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOutcome {
    /// 1-based iteration that succeeded.
    pub attempts: u32,
    pub via: Strategy,
    /// Speed read back after the change, if the drive answered.
    pub reported_speed: Option<u32>,
}

pub struct SpeedController {
    settings: Settings,
    progress: ProgressHelper,
}

impl SpeedController {
    pub fn new(settings: Settings, progress_callback: ProgressCallbackArc) -> Self {
        Self {
            settings,
            progress: ProgressHelper::new(progress_callback, 0),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Wait for the device, then set the speed on the real device nodes.
    pub fn run_set(&self, request: &SpeedRequest) -> Result<SetOutcome> {
        let mut primary = PrimaryPath::new(request.device_path());
        ready::wait_until_ready(
            &mut primary,
            request.ready_secs(),
            self.settings.ready_poll_interval,
            &self.progress,
        )?;

        let mut fallback = request
            .fallback_path()
            .map(|path| FallbackPath::sg(path, &self.settings));
        self.set_speed(request, &mut primary, fallback.as_mut())
    }

    /// Read the current speed from the real block device.
    pub fn run_query(&self, device_path: &str) -> Result<u32> {
        self.query(&mut PrimaryPath::new(device_path))
    }

    pub fn query<R>(&self, reader: &mut R) -> Result<u32>
    where
        R: SpeedReader + ?Sized,
    {
        let speed = reader.read_speed()?;
        tracing::debug!("Current speed: {}", speed);
        Ok(speed)
    }

    /// The bounded primary-then-fallback loop.
    pub fn set_speed<P, F>(
        &self,
        request: &SpeedRequest,
        primary: &mut P,
        mut fallback: Option<&mut F>,
    ) -> Result<SetOutcome>
    where
        P: SpeedSetter + SpeedReader + ?Sized,
        F: SpeedSetter + ?Sized,
    {
        let speed = request.target_speed();
        let max = request.max_retries();

        for attempt in 1..=max {
            tracing::debug!("[+] Attempt {} to set speed to {}...", attempt, speed);
            let spinner = self.progress.create_spinner(format!(
                "Setting speed to {} (attempt {}/{})...",
                speed, attempt, max
            ));

            let primary_err = match primary.set_speed(speed) {
                Ok(()) => {
                    let via = primary.strategy();
                    spinner.finish_with_message(format!("Speed set via {via}"));
                    return Ok(self.succeeded(primary, attempt, via));
                }
                Err(e) => e,
            };
            tracing::warn!("attempt {}: {}", attempt, primary_err);

            let fallback_err = match fallback.as_deref_mut() {
                Some(path) => match path.set_speed(speed) {
                    Ok(()) => {
                        let via = path.strategy();
                        spinner.finish_with_message(format!("Speed set via {via}"));
                        return Ok(self.succeeded(primary, attempt, via));
                    }
                    Err(e) => {
                        tracing::warn!("attempt {}: {}", attempt, e);
                        Some(e)
                    }
                },
                None => None,
            };

            let result = AttemptResult::classify(Some(false), fallback_err.as_ref().map(|_| false));
            let retrying = attempt < max;
            spinner.finish_with_message(attempt_message(
                attempt,
                result,
                request.verbose(),
                &primary_err,
                fallback_err.as_ref(),
                retrying,
            ));

            if retrying {
                std::thread::sleep(self.settings.retry_delay);
            }
        }

        tracing::debug!("[+] Failed to set speed after {} attempts", max);
        Err(Error::RetriesExhausted { attempts: max })
    }

    fn succeeded<P>(&self, primary: &mut P, attempt: u32, via: Strategy) -> SetOutcome
    where
        P: SpeedReader + ?Sized,
    {
        tracing::info!("[+] Speed set successfully using {} on attempt {}", via, attempt);
        let reported_speed = match primary.read_speed() {
            Ok(speed) => {
                tracing::debug!("Current speed: {}", speed);
                Some(speed)
            }
            Err(e) => {
                tracing::warn!("speed read-back failed: {}", e);
                None
            }
        };
        SetOutcome {
            attempts: attempt,
            via,
            reported_speed,
        }
    }
}

fn attempt_message(
    attempt: u32,
    result: AttemptResult,
    verbose: bool,
    primary_err: &Error,
    fallback_err: Option<&Error>,
    retrying: bool,
) -> String {
    let mut message = format!("Attempt {}: {}", attempt, result);
    if verbose {
        message.push_str(&format!(" ({primary_err}"));
        if let Some(e) = fallback_err {
            message.push_str(&format!("; {e}"));
        }
        message.push(')');
    }
    if retrying {
        message.push_str(", retrying...");
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_combination() {
        assert_eq!(AttemptResult::classify(Some(true), None), AttemptResult::Success);
        assert_eq!(AttemptResult::classify(Some(false), Some(true)), AttemptResult::Success);
        assert_eq!(AttemptResult::classify(Some(false), None), AttemptResult::PrimaryFailed);
        assert_eq!(AttemptResult::classify(Some(false), Some(false)), AttemptResult::BothFailed);
        assert_eq!(AttemptResult::classify(None, Some(false)), AttemptResult::FallbackFailed);
    }

    #[test]
    fn zero_speed_is_rejected() {
        let err = SpeedRequest::new("/dev/sr0", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn empty_fallback_path_disables_fallback() {
        let request = SpeedRequest::new("/dev/sr0", 4)
            .unwrap()
            .with_fallback(Some(String::new()));
        assert_eq!(request.fallback_path(), None);
    }

    #[test]
    fn verbose_message_carries_error_text() {
        let err = Error::RetriesExhausted { attempts: 1 };
        let quiet = attempt_message(2, AttemptResult::PrimaryFailed, false, &err, None, true);
        assert_eq!(quiet, "Attempt 2: ioctl failed, retrying...");

        let loud = attempt_message(2, AttemptResult::BothFailed, true, &err, Some(&err), false);
        assert_eq!(
            loud,
            "Attempt 2: ioctl and SG_IO failed (failed to set speed after 1 attempt(s); failed to set speed after 1 attempt(s))"
        );
    }
}
