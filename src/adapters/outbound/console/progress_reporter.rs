use crate::ports::outbound::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// StderrProgressReporter adapter for reporting progress to stderr
///
/// This adapter implements the ProgressReporter port, writing progress
/// information to stderr so it doesn't interfere with stdout output.
/// Stage transitions drive an indicatif spinner.
pub struct StderrProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn create_spinner() -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("   {spinner:.green} [{pos}/{len}] {msg} ({elapsed})")
        {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    fn finish_spinner(&self) {
        if let Ok(mut guard) = self.spinner.lock() {
            if let Some(spinner) = guard.take() {
                spinner.finish_and_clear();
            }
        }
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        match self.spinner.lock().ok().and_then(|guard| guard.clone()) {
            Some(spinner) => spinner.println(message),
            None => eprintln!("{}", message),
        }
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        let spinner = guard.get_or_insert_with(Self::create_spinner);
        spinner.set_length(total as u64);
        spinner.set_position(current as u64);
        if let Some(msg) = message {
            spinner.set_message(msg.to_string());
        }
    }

    fn report_error(&self, message: &str) {
        self.finish_spinner();
        eprintln!("{}", message);
    }

    fn report_completion(&self, message: &str) {
        self.finish_spinner();
        eprintln!();
        eprintln!("{}", message);
    }
}
