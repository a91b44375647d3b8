use arc_swap::ArcSwapOption;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Global on/off switch plus an optional timed pause.
#[derive(Debug, Clone)]
pub struct BlockingState {
    enabled: Arc<AtomicBool>,
    // If Some(Instant), blocking is paused until that instant.
    paused_until: Arc<ArcSwapOption<Instant>>,
}

impl BlockingState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
            paused_until: Arc::new(ArcSwapOption::empty()),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enabled and not inside a pause window.
    pub fn is_blocking_active(&self) -> bool {
        self.is_enabled() && self.pause_remaining().is_none()
    }

    pub fn pause_for(&self, duration: Duration) {
        self.paused_until
            .store(Some(Arc::new(Instant::now() + duration)));
    }

    pub fn resume(&self) {
        self.paused_until.store(None);
    }

    pub fn pause_remaining(&self) -> Option<Duration> {
        let until = self.paused_until.load_full()?;
        let now = Instant::now();
        (*until > now).then(|| *until - now)
    }
}

impl Default for BlockingState {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let state = BlockingState::default();
        assert!(state.is_blocking_active());
        state.set_enabled(false);
        assert!(!state.is_blocking_active());
        state.set_enabled(true);
        assert!(state.is_blocking_active());
    }

    #[test]
    fn test_pause_and_resume() {
        let state = BlockingState::new(true);
        state.pause_for(Duration::from_secs(60));
        assert!(!state.is_blocking_active());
        assert!(state.pause_remaining().unwrap() <= Duration::from_secs(60));
        state.resume();
        assert!(state.is_blocking_active());
    }

    #[test]
    fn test_expired_pause_is_inactive() {
        let state = BlockingState::new(true);
        state.pause_for(Duration::ZERO);
        assert!(state.pause_remaining().is_none());
        assert!(state.is_blocking_active());
    }
}
