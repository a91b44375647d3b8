use crate::engine::BlockReason;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};
use tracing::info;

const REASON_KINDS: [&str; 5] = [
    "critical_domain",
    "critical_marker",
    "domain",
    "subdomain",
    "pattern",
];

/// Lock-free decision counters.
#[derive(Debug, Default)]
pub struct StatsCollector {
    checked: AtomicU64,
    blocked: AtomicU64,
    blocked_by_kind: [AtomicU64; 5],
    navigations_suppressed: AtomicU64,
    navigations_redirected: AtomicU64,
    refresh_passes: AtomicU64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub checked: u64,
    pub blocked: u64,
    pub blocked_by_kind: Vec<(String, u64)>,
    pub navigations_suppressed: u64,
    pub navigations_redirected: u64,
    pub refresh_passes: u64,
}

impl StatsCollector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_checked(&self) {
        self.checked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_blocked(&self, reason: &BlockReason) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
        if let Some(idx) = REASON_KINDS.iter().position(|k| *k == reason.kind()) {
            self.blocked_by_kind[idx].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_navigation(&self, suppressed: bool) {
        if suppressed {
            self.navigations_suppressed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.navigations_redirected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_refresh_passes(&self) {
        self.refresh_passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            checked: self.checked.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            blocked_by_kind: REASON_KINDS
                .iter()
                .zip(&self.blocked_by_kind)
                .map(|(k, v)| (k.to_string(), v.load(Ordering::Relaxed)))
                .collect(),
            navigations_suppressed: self.navigations_suppressed.load(Ordering::Relaxed),
            navigations_redirected: self.navigations_redirected.load(Ordering::Relaxed),
            refresh_passes: self.refresh_passes.load(Ordering::Relaxed),
        }
    }

    /// Spawns a background task that logs a summary every `interval`,
    /// at most once per second.
    pub fn spawn_logger(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let stats = self.clone();
        let interval = interval.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                stats.dump_stats();
            }
        })
    }

    fn dump_stats(&self) {
        let snapshot = self.get_snapshot();
        let pct = if snapshot.checked > 0 {
            (snapshot.blocked as f64 / snapshot.checked as f64) * 100.0
        } else {
            0.0
        };

        let mut block_stats = String::new();
        for (kind, count) in snapshot.blocked_by_kind.iter().filter(|(_, c)| *c > 0) {
            block_stats.push_str(&format!("[{}: {}] ", kind, count));
        }

        info!(
            "STATS DUMP: Checked: {}, Blocked: {} ({:.1}%), Navigations suppressed/redirected: {}/{}, Refreshes: {} {}",
            snapshot.checked,
            snapshot.blocked,
            pct,
            snapshot.navigations_suppressed,
            snapshot.navigations_redirected,
            snapshot.refresh_passes,
            block_stats
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = StatsCollector::new();
        stats.inc_checked();
        stats.inc_checked();
        stats.inc_blocked(&BlockReason::Domain);
        stats.inc_navigation(true);
        stats.inc_navigation(false);
        stats.inc_navigation(false);

        let snap = stats.get_snapshot();
        assert_eq!(snap.checked, 2);
        assert_eq!(snap.blocked, 1);
        assert_eq!(snap.blocked_by_kind[2], ("domain".to_string(), 1));
        assert_eq!(snap.navigations_suppressed, 1);
        assert_eq!(snap.navigations_redirected, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_logger_keeps_running() {
        let stats = StatsCollector::new();
        let handle = stats.spawn_logger(Duration::ZERO);

        time::sleep(Duration::from_secs(5)).await;

        assert!(!handle.is_finished());
        handle.abort();
    }
}
