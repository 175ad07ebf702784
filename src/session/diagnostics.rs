use parking_lot::Mutex;
use std::sync::Arc;

/// Receives the failure messages a session produces.
///
/// Closures taking `&str` implement it directly.
pub trait Diagnostics: Send + Sync {
    /// Called once per failure with a `context: error` message.
    fn report(&self, message: &str);
}

/// Forwards messages to the `log` facade at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, message: &str) {
        log::error!("{}", message);
    }
}

/// Keeps every reported message; clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingDiagnostics {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the messages reported so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

impl<F> Diagnostics for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}
