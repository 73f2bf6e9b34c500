/// Leveled diagnostics sink.
///
/// Lines go through the `log` facade. A severe report also clears the
/// loop's running flag, so the loop exits before its next iteration and the
/// controller's `stop()`/`join()` completes normally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Severity {
    Info,
    Warning,
    Severe,
}

#[derive(Clone, Debug)]
pub struct Diagnostics {
    running: Arc<AtomicBool>,
}

impl Diagnostics {
    pub fn new(running: Arc<AtomicBool>) -> Self {
        Diagnostics { running }
    }

    pub fn report(&self, severity: Severity, line: &str) {
        match severity {
            Severity::Info => log::info!("{line}"),
            Severity::Warning => log::warn!("{line}"),
            Severity::Severe => {
                log::error!("{line}");
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }

    pub fn info(&self, line: &str) {
        self.report(Severity::Info, line);
    }

    pub fn warning(&self, line: &str) {
        self.report(Severity::Warning, line);
    }

    pub fn severe(&self, line: &str) {
        self.report(Severity::Severe, line);
    }
}
