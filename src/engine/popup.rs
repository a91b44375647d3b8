//! Judges new-window / new-navigation requests.
//!
//! Nothing here ever opens a new surface: a navigation is either suppressed
//! or redirected into the surface that asked for it.

use super::blocker::AdBlocker;
use super::matcher::BlockReason;
use serde::Serialize;

pub const POPUP_INDICATORS: &[&str] = &[
    "popup",
    "pop-up",
    "popunder",
    "overlay",
    "modal",
    "advertisement",
    "ads",
    "banner",
    "promo",
    "offer",
    "survey",
    "feedback",
    "newsletter",
    "subscribe",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NavigationVerdict {
    /// Drop the navigation entirely.
    Suppress(SuppressReason),
    /// Load the URL in the existing surface instead of a new one.
    Redirect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SuppressReason {
    Blocked(BlockReason),
    PopupIndicator(&'static str),
}

impl NavigationVerdict {
    pub fn is_suppressed(&self) -> bool {
        matches!(self, NavigationVerdict::Suppress(_))
    }
}

/// Returns the first popup indicator contained in `url`, case-insensitively.
pub fn popup_indicator(url: &str) -> Option<&'static str> {
    if url.is_empty() {
        return None;
    }
    let lower = url.to_lowercase();
    POPUP_INDICATORS
        .iter()
        .copied()
        .find(|indicator| lower.contains(indicator))
}

/// Runs regardless of the global toggle; new surfaces are never opened.
pub fn classify_navigation(blocker: &AdBlocker, url: &str) -> NavigationVerdict {
    if let Some(reason) = blocker.match_rules(url) {
        return NavigationVerdict::Suppress(SuppressReason::Blocked(reason));
    }
    if let Some(indicator) = popup_indicator(url) {
        return NavigationVerdict::Suppress(SuppressReason::PopupIndicator(indicator));
    }
    NavigationVerdict::Redirect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_popup_indicator() {
        assert_eq!(
            popup_indicator("https://site.com/Newsletter/join"),
            Some("newsletter")
        );
        assert_eq!(popup_indicator("https://site.com/article/42"), None);
        assert_eq!(popup_indicator(""), None);
    }
}
