#![allow(dead_code)]

use scanguard::prelude::*;
use std::sync::{Arc, Mutex};

/// Mock ProgressReporter that captures every call as a line of text
///
/// Stage transitions are recorded as `stage i/n: name`, errors with an
/// `Error:` prefix and completions with a `Completed:` prefix.
#[derive(Default, Clone)]
pub struct MockProgressReporter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MockProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_messages(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Stage lines only, in the order the engine entered them
    pub fn stages(&self) -> Vec<String> {
        self.get_messages()
            .into_iter()
            .filter(|line| line.starts_with("stage "))
            .collect()
    }

    fn push(&self, line: String) {
        self.lines.lock().unwrap().push(line);
    }
}

impl ProgressReporter for MockProgressReporter {
    fn report(&self, message: &str) {
        self.push(message.to_string());
    }

    fn report_progress(&self, current: usize, total: usize, message: Option<&str>) {
        self.push(format!(
            "stage {}/{}: {}",
            current,
            total,
            message.unwrap_or("-")
        ));
    }

    fn report_error(&self, message: &str) {
        self.push(format!("Error: {}", message));
    }

    fn report_completion(&self, message: &str) {
        self.push(format!("Completed: {}", message));
    }
}
