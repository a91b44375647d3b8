//! Request and navigation ad-blocking engine.
//!
//! A host network layer asks [`engine::AdBlocker::should_block`] about every
//! outbound request and [`engine::AdBlocker::classify_navigation`] about every
//! new-window request. Rules come from a fixed critical set loaded at
//! construction, a user override file, and remote filter lists that are
//! cached on disk and refreshed in the background.

pub mod config;
pub mod engine;
pub mod error;
pub mod init;
pub mod logger;
pub mod stats;
