//! Initialization helpers for the application startup.

use crate::config::Config;
use crate::engine::AdBlocker;
use crate::logger::DecisionLogger;
use crate::stats::StatsCollector;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Sets up the tracing subscriber with the configured filters.
pub fn setup_logging(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = config.logging.level.clone();

        // Suppress HTTP stack logs unless explicitly enabled/overridden
        for noisy in ["reqwest", "hyper", "hyper_util", "rustls"] {
            if !filter.contains(noisy) {
                filter.push_str(&format!(",{}=off", noisy));
            }
        }

        tracing_subscriber::EnvFilter::new(filter)
    });

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Builds the engine with the configured logger and counters and starts
/// hydration in the background.
pub fn init_engine(config: &Config) -> Result<(Arc<AdBlocker>, Arc<StatsCollector>)> {
    let stats = StatsCollector::new();
    if config.stats.enable {
        stats.spawn_logger(Duration::from_secs(config.stats.log_interval_seconds));
    }

    let mut builder = AdBlocker::builder(config.clone()).stats(stats.clone());
    if config.logging.enable {
        info!("Decision logging enabled ({} sinks).", config.logging.sinks.len());
        builder = builder.logger(DecisionLogger::new(config.logging.clone()));
    }

    let blocker = builder.build()?;
    blocker.start();
    Ok((blocker, stats))
}
