use super::parser::parse_filter_list;
use super::store::{RuleBatch, RuleStore};
use super::traits::ListDownloader;
use crate::error::FetchError;
use arc_swap::ArcSwap;
use futures::{stream, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, error, info, warn};

/// A cached list older than this is downloaded again.
pub const STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);
pub const MAX_ATTEMPTS: u32 = 3;
/// Delay before retry `n` is `n * BACKOFF_STEP`.
pub const BACKOFF_STEP: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RefreshOutcome {
    /// Fresh content downloaded and written to the cache.
    Downloaded,
    /// Cache was younger than [`STALE_AFTER`] and reused.
    Cached,
    /// Download failed; the previous cache file was parsed instead.
    StaleFallback,
    /// Nothing could be loaded for this source.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub url: String,
    pub outcome: Option<RefreshOutcome>,
    /// Modification time of the cache file, i.e. the last successful download.
    pub last_updated: Option<SystemTime>,
    pub domains: usize,
    pub patterns: usize,
}

impl SourceStatus {
    fn pending(source: &FilterSource) -> Self {
        Self {
            name: source.name.clone(),
            url: source.url.clone(),
            outcome: None,
            last_updated: None,
            domains: 0,
            patterns: 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.outcome == Some(RefreshOutcome::Failed)
    }
}

/// Downloads, caches and parses the configured remote filter lists.
pub struct FilterListFetcher {
    sources: Vec<FilterSource>,
    cache_dir: PathBuf,
    downloader: Arc<dyn ListDownloader>,
    concurrency: usize,
    statuses: ArcSwap<Vec<SourceStatus>>,
}

impl FilterListFetcher {
    pub fn new(
        sources: Vec<FilterSource>,
        cache_dir: impl Into<PathBuf>,
        downloader: Arc<dyn ListDownloader>,
        concurrency: usize,
    ) -> Self {
        let cache_dir = cache_dir.into();
        // Report existing caches before the first pass completes
        let statuses = sources
            .iter()
            .map(|source| {
                let cache_path = cache_dir.join(format!("{}.txt", source.name));
                let mut status = SourceStatus::pending(source);
                status.last_updated = std::fs::metadata(cache_path)
                    .and_then(|m| m.modified())
                    .ok();
                status
            })
            .collect();
        Self {
            sources,
            cache_dir,
            downloader,
            concurrency: concurrency.max(1),
            statuses: ArcSwap::from_pointee(statuses),
        }
    }

    pub fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.txt", name))
    }

    /// Status of every source as of the last completed pass.
    pub fn statuses(&self) -> Arc<Vec<SourceStatus>> {
        self.statuses.load_full()
    }

    /// Runs one refresh pass over every source and merges the results into
    /// `store`. A failing source never affects the others.
    pub async fn refresh(&self, store: &RuleStore) -> Arc<Vec<SourceStatus>> {
        info!("Refreshing {} filter lists...", self.sources.len());

        let tasks: Vec<_> = self
            .sources
            .iter()
            .map(|source| self.refresh_source(source, store))
            .collect();

        let mut results: Vec<SourceStatus> = stream::iter(tasks)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.sort_by(|a, b| a.name.cmp(&b.name));

        let failed: Vec<&str> = results
            .iter()
            .filter(|s| s.is_failed())
            .map(|s| s.name.as_str())
            .collect();
        info!(
            "Filter list refresh complete. Loaded: {}, Failed: {}",
            results.len() - failed.len(),
            failed.len()
        );
        if !failed.is_empty() {
            warn!("Failed lists: {}", failed.join(", "));
        }

        let results = Arc::new(results);
        self.statuses.store(results.clone());
        results
    }

    async fn refresh_source(&self, source: &FilterSource, store: &RuleStore) -> SourceStatus {
        let cache_path = self.cache_path(&source.name);
        let (outcome, content) = self.acquire(source, &cache_path).await;

        let mut status = SourceStatus::pending(source);
        status.outcome = Some(outcome);

        if let Some(text) = content {
            let parsed =
                tokio::task::spawn_blocking(move || RuleBatch::compile(parse_filter_list(&text)))
                    .await;
            match parsed {
                Ok(batch) => {
                    status.domains = batch.domain_count();
                    status.patterns = batch.pattern_count();
                    store.apply(batch);
                    info!(
                        "Parsed '{}' ({:?}): {} domains, {} patterns",
                        source.name, outcome, status.domains, status.patterns
                    );
                }
                Err(e) => {
                    error!("Parsing task for '{}' failed: {}", source.name, e);
                    status.outcome = Some(RefreshOutcome::Failed);
                }
            }
        }

        status.last_updated = modified_time(&cache_path).await;
        status
    }

    async fn acquire(
        &self,
        source: &FilterSource,
        cache_path: &Path,
    ) -> (RefreshOutcome, Option<String>) {
        if !needs_refresh(cache_path).await {
            match fs::read_to_string(cache_path).await {
                Ok(text) => {
                    debug!("Using cached filter list '{}'", source.name);
                    return (RefreshOutcome::Cached, Some(text));
                }
                Err(e) => warn!(
                    "Cached list '{}' unreadable ({}), downloading",
                    source.name, e
                ),
            }
        }

        match self.download_with_retry(source).await {
            Ok(text) => {
                if let Err(e) = self.write_cache(cache_path, &text).await {
                    warn!("Failed to cache '{}': {}", source.name, e);
                }
                (RefreshOutcome::Downloaded, Some(text))
            }
            Err(e) => {
                warn!("Giving up on '{}': {}", source.name, e);
                match fs::read_to_string(cache_path).await {
                    Ok(text) => {
                        info!("Falling back to stale cache for '{}'", source.name);
                        (RefreshOutcome::StaleFallback, Some(text))
                    }
                    Err(_) => (RefreshOutcome::Failed, None),
                }
            }
        }
    }

    async fn download_with_retry(&self, source: &FilterSource) -> Result<String, FetchError> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            info!(
                "Fetching filter list '{}' from {} (attempt {}/{})",
                source.name, source.url, attempt, MAX_ATTEMPTS
            );
            match self.downloader.download(&source.url).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() => {
                    warn!(
                        "Download of '{}' failed (attempt {}): {}",
                        source.name, attempt, e
                    );
                    last_err = Some(e);
                }
                Err(e) => {
                    error!("Download of '{}' failed, not retrying: {}", source.name, e);
                    return Err(e);
                }
            }

            if attempt < MAX_ATTEMPTS {
                tokio::time::sleep(BACKOFF_STEP * attempt).await;
            }
        }

        Err(last_err.unwrap_or_else(|| FetchError::Unexpected("no attempts made".into())))
    }

    /// Replaces the cache file wholesale via a temporary sibling.
    async fn write_cache(&self, cache_path: &Path, text: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;
        let tmp = cache_path.with_extension("txt.tmp");
        fs::write(&tmp, text).await?;
        fs::rename(&tmp, cache_path).await
    }
}

async fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).await.ok()?.modified().ok()
}

/// True when the cache file is missing or older than [`STALE_AFTER`].
pub async fn needs_refresh(path: &Path) -> bool {
    match modified_time(path).await {
        Some(modified) => SystemTime::now()
            .duration_since(modified)
            .map(|age| age > STALE_AFTER)
            .unwrap_or(false),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays scripted responses and counts calls.
    struct ScriptedDownloader {
        responses: Mutex<VecDeque<Result<String, FetchError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedDownloader {
        fn new(responses: Vec<Result<String, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ListDownloader for ScriptedDownloader {
        async fn download(&self, _url: &str) -> Result<String, FetchError> {
            *self.calls.lock().unwrap() += 1;
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Transport("script exhausted".into())))
        }
    }

    fn source(name: &str) -> FilterSource {
        FilterSource {
            name: name.into(),
            url: format!("https://lists.example.com/{}.txt", name),
        }
    }

    fn fetcher(dir: &TempDir, downloader: Arc<ScriptedDownloader>) -> FilterListFetcher {
        FilterListFetcher::new(vec![source("Test")], dir.path(), downloader, 2)
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_writes_cache_and_loads_rules() {
        let dir = TempDir::new().unwrap();
        let downloader = ScriptedDownloader::new(vec![Ok(
            "||tracker.example.net^\n0.0.0.0 ads.example.com\n".to_string()
        )]);
        let fetcher = fetcher(&dir, downloader.clone());
        let store = RuleStore::new();

        let statuses = fetcher.refresh(&store).await;

        assert_eq!(statuses[0].outcome, Some(RefreshOutcome::Downloaded));
        assert_eq!(statuses[0].domains, 2);
        assert!(statuses[0].last_updated.is_some());
        assert!(store.load().contains_domain("tracker.example.net"));
        let cached = std::fs::read_to_string(dir.path().join("Test.txt")).unwrap();
        assert!(cached.contains("ads.example.com"));
        assert_eq!(downloader.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retry_with_backoff() {
        let dir = TempDir::new().unwrap();
        let downloader = ScriptedDownloader::new(vec![
            Err(FetchError::Status(503)),
            Err(FetchError::Transport("reset".into())),
            Ok("||late.example.com^\n".to_string()),
        ]);
        let fetcher = fetcher(&dir, downloader.clone());
        let store = RuleStore::new();

        let start = tokio::time::Instant::now();
        let statuses = fetcher.refresh(&store).await;

        assert_eq!(downloader.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(6));
        assert_eq!(statuses[0].outcome, Some(RefreshOutcome::Downloaded));
        assert!(store.load().contains_domain("late.example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_failure_aborts_retries() {
        let dir = TempDir::new().unwrap();
        let downloader = ScriptedDownloader::new(vec![
            Err(FetchError::Unexpected("bad encoding".into())),
            Ok("||never.example.com^\n".to_string()),
        ]);
        let fetcher = fetcher(&dir, downloader.clone());
        let store = RuleStore::new();

        let statuses = fetcher.refresh(&store).await;

        assert_eq!(downloader.calls(), 1);
        assert!(statuses[0].is_failed());
        assert_eq!(store.domain_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fall_back_to_stale_cache() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("Test.txt");
        std::fs::write(&cache, "||old.example.com^\n").unwrap();
        // Age the file past the staleness threshold.
        let old = SystemTime::now() - Duration::from_secs(48 * 60 * 60);
        std::fs::File::options()
            .write(true)
            .open(&cache)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let downloader = ScriptedDownloader::new(vec![]);
        let fetcher = fetcher(&dir, downloader.clone());
        let store = RuleStore::new();

        let statuses = fetcher.refresh(&store).await;

        assert_eq!(downloader.calls(), MAX_ATTEMPTS);
        assert_eq!(statuses[0].outcome, Some(RefreshOutcome::StaleFallback));
        assert!(store.load().contains_domain("old.example.com"));
        assert_eq!(
            std::fs::read_to_string(&cache).unwrap(),
            "||old.example.com^\n"
        );
        let last_updated = statuses[0].last_updated.unwrap();
        assert!(last_updated < SystemTime::now() - STALE_AFTER);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_download() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Test.txt"), "0.0.0.0 cached.example.com\n").unwrap();

        let downloader = ScriptedDownloader::new(vec![]);
        let fetcher = fetcher(&dir, downloader.clone());
        let store = RuleStore::new();

        let statuses = fetcher.refresh(&store).await;

        assert_eq!(downloader.calls(), 0);
        assert_eq!(statuses[0].outcome, Some(RefreshOutcome::Cached));
        assert!(store.load().contains_domain("cached.example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_source_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Good.txt"), "||good.example.com^\n").unwrap();

        let downloader = ScriptedDownloader::new(vec![]);
        let fetcher = FilterListFetcher::new(
            vec![source("Bad"), source("Good")],
            dir.path(),
            downloader,
            1,
        );
        let store = RuleStore::new();

        let statuses = fetcher.refresh(&store).await;

        assert_eq!(statuses.len(), 2);
        assert!(statuses[0].is_failed());
        assert_eq!(statuses[1].outcome, Some(RefreshOutcome::Cached));
        assert!(store.load().contains_domain("good.example.com"));
        assert_eq!(fetcher.statuses()[0].name, "Bad");
    }

    #[tokio::test]
    async fn test_refresh_runs_on_spawned_task() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Test.txt"), "||spawned.example.com^\n").unwrap();
        let fetcher = Arc::new(fetcher(&dir, ScriptedDownloader::new(vec![])));
        let store = Arc::new(RuleStore::new());

        let handle = {
            let fetcher = fetcher.clone();
            let store = store.clone();
            tokio::spawn(async move { fetcher.refresh(&store).await })
        };
        let statuses = handle.await.unwrap();

        assert_eq!(statuses[0].outcome, Some(RefreshOutcome::Cached));
        assert!(store.load().contains_domain("spawned.example.com"));
    }

    #[tokio::test]
    async fn test_repeated_refresh_does_not_grow_rules() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("Test.txt"),
            "||a.example.com^\n/banner/*/img^\n/pop*under\n",
        )
        .unwrap();
        let fetcher = fetcher(&dir, ScriptedDownloader::new(vec![]));
        let store = RuleStore::new();

        fetcher.refresh(&store).await;
        let (domains, patterns) = (store.domain_count(), store.pattern_count());
        assert_eq!(patterns, 2);
        for _ in 0..3 {
            fetcher.refresh(&store).await;
        }

        assert_eq!(store.domain_count(), domains);
        assert_eq!(store.pattern_count(), patterns);
    }

    #[test]
    fn test_statuses_seeded_from_existing_cache() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Test.txt"), "||a.example.com^\n").unwrap();
        let fetcher = FilterListFetcher::new(
            vec![source("Test"), source("Missing")],
            dir.path(),
            ScriptedDownloader::new(vec![]),
            1,
        );

        let statuses = fetcher.statuses();
        assert_eq!(statuses[0].outcome, None);
        assert!(statuses[0].last_updated.is_some());
        assert!(statuses[1].last_updated.is_none());
    }

    #[tokio::test]
    async fn test_needs_refresh_for_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(needs_refresh(&dir.path().join("missing.txt")).await);
        let path = dir.path().join("present.txt");
        std::fs::write(&path, "x").unwrap();
        assert!(!needs_refresh(&path).await);
    }
}
