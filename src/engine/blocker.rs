use super::critical::{
    BASELINE_DOMAINS, BASELINE_PATTERNS, CRITICAL_DOMAINS, CRITICAL_PATTERNS, OVERRIDE_TEMPLATE,
};
use super::downloader::HttpDownloader;
use super::fetcher::{FilterListFetcher, FilterSource, SourceStatus};
use super::matcher::{BlockReason, PriorityRules, RequestTarget};
use super::parser::{parse_override_list, ParsedList};
use super::popup::{self, NavigationVerdict, SuppressReason};
use super::state::BlockingState;
use super::store::{RuleBatch, RuleStore};
use super::traits::{ListDownloader, RuleMatcher};
use crate::config::Config;
use crate::logger::{DecisionAction, DecisionLogEntry, DecisionLogger};
use crate::stats::{StatsCollector, StatsSnapshot};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Point-in-time view of the engine for the host to display.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub enabled: bool,
    pub initialized: bool,
    pub domains: usize,
    pub patterns: usize,
    /// Newest successful download across all sources.
    pub last_update: Option<SystemTime>,
    pub sources: Vec<SourceStatus>,
    pub failed_sources: Vec<String>,
    pub counters: StatsSnapshot,
}

pub struct AdBlockerBuilder {
    config: Config,
    downloader: Option<Arc<dyn ListDownloader>>,
    logger: Option<Arc<DecisionLogger>>,
    stats: Option<Arc<StatsCollector>>,
}

impl AdBlockerBuilder {
    pub fn downloader(mut self, downloader: Arc<dyn ListDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn logger(mut self, logger: Arc<DecisionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn stats(mut self, stats: Arc<StatsCollector>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Loads the critical rule set synchronously. The returned engine blocks
    /// the worst offenders right away; call [`AdBlocker::start`] to hydrate
    /// the rest in the background.
    pub fn build(self) -> Result<Arc<AdBlocker>> {
        let config = self.config;
        let downloader = match self.downloader {
            Some(d) => d,
            None => Arc::new(HttpDownloader::new(Duration::from_secs(
                config.updates.request_timeout_secs,
            ))?),
        };

        let sources = config
            .sources_sorted()
            .into_iter()
            .map(|(name, url)| FilterSource { name, url })
            .collect();
        let fetcher = FilterListFetcher::new(
            sources,
            &config.cache_dir,
            downloader,
            config.updates.concurrent_downloads,
        );

        let blocker = AdBlocker {
            store: RuleStore::new(),
            initialized: AtomicBool::new(false),
            state: BlockingState::new(config.enabled),
            fetcher,
            override_path: PathBuf::from(&config.override_file),
            stats: self.stats.unwrap_or_else(StatsCollector::new),
            logger: self.logger,
        };
        blocker.bootstrap();
        Ok(Arc::new(blocker))
    }
}

/// The ad-blocking engine handle shared with the host.
pub struct AdBlocker {
    store: RuleStore,
    initialized: AtomicBool,
    state: BlockingState,
    fetcher: FilterListFetcher,
    override_path: PathBuf,
    stats: Arc<StatsCollector>,
    logger: Option<Arc<DecisionLogger>>,
}

impl AdBlocker {
    pub fn builder(config: Config) -> AdBlockerBuilder {
        AdBlockerBuilder {
            config,
            downloader: None,
            logger: None,
            stats: None,
        }
    }

    /// Builds the engine and immediately starts background hydration.
    /// Must be called from within a tokio runtime.
    pub fn launch(config: Config) -> Result<Arc<Self>> {
        let blocker = Self::builder(config).build()?;
        blocker.start();
        Ok(blocker)
    }

    fn bootstrap(&self) {
        self.store
            .apply(RuleBatch::from_tables(CRITICAL_DOMAINS, CRITICAL_PATTERNS));
        self.initialized.store(true, Ordering::Release);
        info!(
            "Critical rules active: {} domains, {} patterns",
            self.store.domain_count(),
            self.store.pattern_count()
        );
    }

    /// Spawns hydration: override file, baseline list, then remote sources.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let blocker = self.clone();
        tokio::spawn(async move {
            blocker.hydrate().await;
        })
    }

    pub async fn hydrate(&self) {
        self.load_override_file().await;

        let baseline = RuleBatch::from_tables(BASELINE_DOMAINS, BASELINE_PATTERNS);
        debug!(
            "Loading baseline list: {} domains, {} patterns",
            baseline.domain_count(),
            baseline.pattern_count()
        );
        self.store.apply(baseline);

        self.refresh_now().await;
        info!(
            "Engine hydrated with {} domains and {} patterns",
            self.store.domain_count(),
            self.store.pattern_count()
        );
    }

    async fn load_override_file(&self) {
        let path = &self.override_path;
        if !fs::try_exists(path).await.unwrap_or(false) {
            match fs::write(path, OVERRIDE_TEMPLATE).await {
                Ok(()) => info!("Created override blocklist {}", path.display()),
                Err(e) => warn!("Failed to create {}: {}", path.display(), e),
            }
        }

        match fs::read_to_string(path).await {
            Ok(text) => {
                let domains = parse_override_list(&text);
                info!(
                    "Loaded {} domains from override blocklist {}",
                    domains.len(),
                    path.display()
                );
                self.store.apply(RuleBatch::compile(ParsedList {
                    domains,
                    patterns: Vec::new(),
                }));
            }
            Err(e) => warn!("Failed to read {}: {}", path.display(), e),
        }
    }

    /// Runs a refresh pass over every remote source now.
    pub async fn refresh_now(&self) -> Arc<Vec<SourceStatus>> {
        let statuses = self.fetcher.refresh(&self.store).await;
        self.stats.inc_refresh_passes();
        statuses
    }

    /// Decides whether a request to `url` must be blocked. Never does I/O.
    pub fn should_block(&self, url: &str) -> bool {
        self.check(url).is_some()
    }

    /// Like [`AdBlocker::should_block`] but reports the matching rule and
    /// records counters and the decision log.
    pub fn check(&self, url: &str) -> Option<BlockReason> {
        let start = Instant::now();
        let reason = self.decide(url);

        self.stats.inc_checked();
        if let Some(r) = &reason {
            self.stats.inc_blocked(r);
        }
        let action = if reason.is_some() {
            DecisionAction::Blocked
        } else {
            DecisionAction::Allowed
        };
        self.log_decision(url, action, reason.as_ref().map(|r| r.to_string()), start);

        reason
    }

    /// Request-path decision: the rule cascade, gated by the global toggle.
    fn decide(&self, url: &str) -> Option<BlockReason> {
        if !self.state.is_blocking_active() {
            return None;
        }
        self.match_rules(url)
    }

    /// The rule cascade without the toggle or any bookkeeping.
    pub(crate) fn match_rules(&self, url: &str) -> Option<BlockReason> {
        if !self.is_initialized() {
            return None;
        }
        let target = RequestTarget::parse(url)?;

        PriorityRules
            .check(&target)
            .or_else(|| self.store.load().check(&target))
    }

    /// Handles a request to open a new window or top-level navigation.
    pub fn classify_navigation(&self, url: &str) -> NavigationVerdict {
        let start = Instant::now();
        let verdict = popup::classify_navigation(self, url);

        self.stats.inc_navigation(verdict.is_suppressed());
        let (action, reason) = match &verdict {
            NavigationVerdict::Suppress(SuppressReason::Blocked(r)) => {
                (DecisionAction::Suppressed, Some(r.to_string()))
            }
            NavigationVerdict::Suppress(SuppressReason::PopupIndicator(i)) => (
                DecisionAction::Suppressed,
                Some(format!("popup indicator '{}'", i)),
            ),
            NavigationVerdict::Redirect => (DecisionAction::Redirected, None),
        };
        self.log_decision(url, action, reason, start);

        verdict
    }

    fn log_decision(
        &self,
        url: &str,
        action: DecisionAction,
        reason: Option<String>,
        start: Instant,
    ) {
        if let Some(logger) = self.logger.as_ref().filter(|l| l.wants(action)) {
            logger.log(DecisionLogEntry {
                url: url.to_string(),
                action,
                reason,
                latency_us: start.elapsed().as_micros() as u64,
            });
        }
    }

    pub fn add_domain(&self, domain: &str) {
        self.store.add_domain(domain);
        info!("Added custom blocked domain: {}", domain);
    }

    pub fn remove_domain(&self, domain: &str) {
        self.store.remove_domain(domain);
        info!("Removed blocked domain: {}", domain);
    }

    pub fn rules(&self) -> &RuleStore {
        &self.store
    }

    pub fn state(&self) -> &BlockingState {
        &self.state
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
        info!("Ad blocking enabled set to: {}", enabled);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> EngineStats {
        let sources = self.fetcher.statuses();
        EngineStats {
            enabled: self.state.is_enabled(),
            initialized: self.is_initialized(),
            domains: self.store.domain_count(),
            patterns: self.store.pattern_count(),
            last_update: sources.iter().filter_map(|s| s.last_updated).max(),
            failed_sources: sources
                .iter()
                .filter(|s| s.is_failed())
                .map(|s| s.name.clone())
                .collect(),
            sources: (*sources).clone(),
            counters: self.stats.get_snapshot(),
        }
    }
}
