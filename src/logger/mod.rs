pub mod console_sink;
pub mod types;

pub use self::console_sink::ConsoleLogSink;
pub use self::types::{DecisionAction, DecisionLogEntry, DecisionLogSink};

use crate::config::LoggingConfig;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Fans decision entries out to background sink tasks.
pub struct DecisionLogger {
    config: LoggingConfig,
    sinks: Vec<mpsc::Sender<DecisionLogEntry>>,
}

impl DecisionLogger {
    /// Must be called from within a tokio runtime.
    pub fn new(config: LoggingConfig) -> Arc<Self> {
        Arc::new(Self::build(config, Vec::new()))
    }

    /// Attaches a caller-provided sink in addition to the configured ones.
    pub fn with_sink(config: LoggingConfig, sink: Box<dyn DecisionLogSink>) -> Arc<Self> {
        Arc::new(Self::build(config, vec![sink]))
    }

    fn build(config: LoggingConfig, extra: Vec<Box<dyn DecisionLogSink>>) -> Self {
        let mut sinks = Vec::new();

        for sink_type in &config.sinks {
            let sink: Box<dyn DecisionLogSink> = match sink_type.as_str() {
                "console" => Box::new(ConsoleLogSink::new(config.clone())),
                other => {
                    warn!("Unknown log sink type: {}", other);
                    continue;
                }
            };
            sinks.push(Self::spawn_sink(sink));
        }
        sinks.extend(extra.into_iter().map(Self::spawn_sink));

        Self { config, sinks }
    }

    fn spawn_sink(sink: Box<dyn DecisionLogSink>) -> mpsc::Sender<DecisionLogEntry> {
        let (tx, mut rx) = mpsc::channel::<DecisionLogEntry>(1000);
        tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                sink.log(&entry);
            }
        });
        tx
    }

    /// Whether an entry with this action would be recorded at all.
    pub fn wants(&self, action: DecisionAction) -> bool {
        if !self.config.enable || self.sinks.is_empty() {
            return false;
        }
        if action.is_block() {
            self.config.log_blocked
        } else {
            self.config.log_allowed
        }
    }

    /// Fire and forget; a full buffer drops the entry.
    pub fn log(&self, entry: DecisionLogEntry) {
        if !self.wants(entry.action) {
            return;
        }
        let len = self.sinks.len();
        for (i, sink) in self.sinks.iter().enumerate() {
            if i == len - 1 {
                let _ = sink.try_send(entry);
                break;
            }
            let _ = sink.try_send(entry.clone());
        }
    }
}
