use crate::error::{Error, Result};
use crate::progress::ProgressHelper;
use crate::speed::ReadinessProbe;
use std::time::Duration;

/// Poll `probe` until it opens, at most `secs + 1` times, `interval` apart.
///
/// Returns the number of probes it took.
pub fn wait_until_ready<P>(
    probe: &mut P,
    secs: u32,
    interval: Duration,
    progress: &ProgressHelper,
) -> Result<u32>
where
    P: ReadinessProbe + ?Sized,
{
    let spinner = progress.create_spinner(format!("Waiting for {}...", probe.path()));
    let max_attempts = secs.saturating_add(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match probe.probe() {
            Ok(()) => {
                tracing::debug!("{} ready after {} probe(s)", probe.path(), attempt);
                spinner.finish_with_message(format!("{} ready", probe.path()));
                return Ok(attempt);
            }
            Err(e) if attempt >= max_attempts => {
                tracing::warn!("{} not ready: {}", probe.path(), e);
                spinner.finish_with_message(format!("{} not ready", probe.path()));
                return Err(Error::DeviceNotReady {
                    path: probe.path().to_string(),
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => {
                tracing::debug!(
                    "{} not ready ({}/{}): {}",
                    probe.path(),
                    attempt,
                    max_attempts,
                    e
                );
                spinner.set_message(format!(
                    "Waiting for {} ({}/{})...",
                    probe.path(),
                    attempt,
                    max_attempts
                ));
                std::thread::sleep(interval);
            }
        }
    }
}
