use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DecisionLogEntry {
    pub url: String,
    pub action: DecisionAction,
    /// Why the request was blocked or the navigation suppressed.
    pub reason: Option<String>,
    pub latency_us: u64,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum DecisionAction {
    Allowed,
    Blocked,
    Suppressed,
    Redirected,
}

impl DecisionAction {
    pub fn is_block(self) -> bool {
        matches!(self, DecisionAction::Blocked | DecisionAction::Suppressed)
    }
}

pub trait DecisionLogSink: Send + Sync {
    fn log(&self, entry: &DecisionLogEntry);
}
