mod blocker;
pub mod critical;
mod downloader;
pub mod fetcher;
mod matcher;
pub mod parser;
pub mod popup;
mod scheduler;
pub mod state;
mod store;
mod traits;

pub use blocker::{AdBlocker, AdBlockerBuilder, EngineStats};
pub use downloader::HttpDownloader;
pub use fetcher::{FilterListFetcher, FilterSource, RefreshOutcome, SourceStatus};
pub use matcher::{is_same_or_subdomain, BlockReason, PriorityRules, RequestTarget};
pub use popup::{NavigationVerdict, SuppressReason};
pub use scheduler::RefreshScheduler;
pub use state::BlockingState;
pub use store::{RuleBatch, RuleSet, RuleStore};
pub use traits::{ListDownloader, RuleMatcher};
