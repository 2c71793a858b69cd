//! CLI progress output.
//!
//! Spinners via indicatif on a terminal, one plain line per finished step
//! otherwise.

use cdspeedctl_lib::progress::{ProgressCallback, ProgressId, ProgressInfo};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Prints `[prefix] message` when a step finishes.
pub struct PlainProgressCallback {
    prefixes: Mutex<HashMap<u64, String>>,
    next_id: AtomicU64,
}

impl PlainProgressCallback {
    pub fn new() -> Self {
        Self {
            prefixes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn print_line(&self, line: &str) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{}", line);
        let _ = stdout.flush();
    }
}

impl Default for PlainProgressCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for PlainProgressCallback {
    fn start(&self, info: ProgressInfo) -> ProgressId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prefixes) = self.prefixes.lock() {
            prefixes.insert(id, info.prefix);
        }
        ProgressId(id)
    }

    fn update_message(&self, _id: ProgressId, _message: String) {}

    fn finish(&self, id: ProgressId, final_message: String) {
        let prefix = self
            .prefixes
            .lock()
            .ok()
            .and_then(|mut prefixes| prefixes.remove(&id.0));
        match prefix {
            Some(prefix) => self.print_line(&format!("[{}] {}", prefix, final_message)),
            None => self.print_line(&final_message),
        }
    }
}

pub struct IndicatifProgressCallback {
    multi_progress: MultiProgress,
    spinners: Mutex<HashMap<u64, ProgressBar>>,
    next_id: AtomicU64,
}

impl IndicatifProgressCallback {
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            spinners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl Default for IndicatifProgressCallback {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for IndicatifProgressCallback {
    fn start(&self, info: ProgressInfo) -> ProgressId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let spinner = self.multi_progress.add(ProgressBar::new_spinner());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_style(
            ProgressStyle::with_template(&format!("[{}] {{spinner}} {{msg}}", info.prefix))
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(info.message);

        if let Ok(mut spinners) = self.spinners.lock() {
            spinners.insert(id, spinner);
        }
        ProgressId(id)
    }

    fn update_message(&self, id: ProgressId, message: String) {
        if let Ok(spinners) = self.spinners.lock()
            && let Some(spinner) = spinners.get(&id.0)
        {
            spinner.set_message(message);
        }
    }

    fn finish(&self, id: ProgressId, final_message: String) {
        if let Ok(mut spinners) = self.spinners.lock()
            && let Some(spinner) = spinners.remove(&id.0)
        {
            spinner.finish_with_message(final_message);
        }
    }
}

/// Spinners on a terminal unless tracing output would interleave with them.
pub fn create_progress_callback(verbose: bool) -> Arc<dyn ProgressCallback> {
    if !verbose && io::stdout().is_terminal() {
        Arc::new(IndicatifProgressCallback::new())
    } else {
        Arc::new(PlainProgressCallback::new())
    }
}
