use crate::config::LoggingConfig;
use crate::logger::types::{DecisionAction, DecisionLogEntry, DecisionLogSink};
use tracing::info;

pub struct ConsoleLogSink {
    config: LoggingConfig,
}

impl ConsoleLogSink {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }
}

impl DecisionLogSink for ConsoleLogSink {
    fn log(&self, entry: &DecisionLogEntry) {
        if self.config.format == "json" {
            // Structured fields via tracing
            info!(
                target: "decision",
                url = %entry.url,
                action = ?entry.action,
                reason = ?entry.reason,
                lat_us = %entry.latency_us
            );
            return;
        }

        let action_str = match (entry.action, &entry.reason) {
            (DecisionAction::Blocked, Some(reason)) => format!("BLOCKED ({})", reason),
            (DecisionAction::Suppressed, Some(reason)) => format!("SUPPRESSED ({})", reason),
            (DecisionAction::Blocked, None) => "BLOCKED".to_string(),
            (DecisionAction::Suppressed, None) => "SUPPRESSED".to_string(),
            (DecisionAction::Allowed, _) => "ALLOWED".to_string(),
            (DecisionAction::Redirected, _) => "REDIRECTED to current view".to_string(),
        };

        info!(target: "decision", "{} -> {} [{}us]", entry.url, action_str, entry.latency_us);
    }
}
