use super::critical::{CRITICAL_DOMAINS, CRITICAL_MARKERS};
use super::traits::RuleMatcher;
use serde::Serialize;
use std::fmt;
use url::Url;

/// A request URL reduced to what the rules look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Lowercased host without a trailing root dot, empty for host-less URLs
    /// such as `data:`.
    pub host: String,
    /// Lowercased full URL.
    pub url: String,
}

impl RequestTarget {
    /// Returns `None` for empty or unparsable input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parsed = Url::parse(raw).ok()?;
        Some(Self {
            host: parsed
                .host_str()
                .unwrap_or_default()
                .trim_end_matches('.')
                .to_ascii_lowercase(),
            url: raw.to_lowercase(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BlockReason {
    CriticalDomain(&'static str),
    CriticalMarker(&'static str),
    Domain,
    Subdomain(String),
    Pattern(String),
}

impl BlockReason {
    /// Stable label used for counters.
    pub fn kind(&self) -> &'static str {
        match self {
            BlockReason::CriticalDomain(_) => "critical_domain",
            BlockReason::CriticalMarker(_) => "critical_marker",
            BlockReason::Domain => "domain",
            BlockReason::Subdomain(_) => "subdomain",
            BlockReason::Pattern(_) => "pattern",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::CriticalDomain(d) => write!(f, "critical domain {}", d),
            BlockReason::CriticalMarker(m) => write!(f, "critical marker '{}'", m),
            BlockReason::Domain => write!(f, "blocked domain"),
            BlockReason::Subdomain(parent) => write!(f, "subdomain of {}", parent),
            BlockReason::Pattern(p) => write!(f, "pattern {}", p),
        }
    }
}

/// Fixed fast path evaluated before the rule store.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriorityRules;

impl RuleMatcher for PriorityRules {
    fn check(&self, target: &RequestTarget) -> Option<BlockReason> {
        let host = target.host.as_str();
        if !host.is_empty() {
            if let Some(domain) = CRITICAL_DOMAINS.iter().find(|d| is_same_or_subdomain(host, d)) {
                return Some(BlockReason::CriticalDomain(*domain));
            }
        }

        CRITICAL_MARKERS
            .iter()
            .find(|m| target.url.contains(*m))
            .map(|m| BlockReason::CriticalMarker(*m))
    }
}

/// `host == domain` or `host` ends with `.domain`.
pub fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    match host.strip_suffix(domain) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let t = RequestTarget::parse("https://Ads.Example.COM/Path?Q=1").unwrap();
        assert_eq!(t.host, "ads.example.com");
        assert_eq!(t.url, "https://ads.example.com/path?q=1");

        assert!(RequestTarget::parse("").is_none());
        assert!(RequestTarget::parse("not a url").is_none());

        let data = RequestTarget::parse("data:text/plain,hi").unwrap();
        assert_eq!(data.host, "");
    }

    #[test]
    fn test_fully_qualified_host_loses_root_dot() {
        let t = RequestTarget::parse("https://Ads.Example.com./x").unwrap();
        assert_eq!(t.host, "ads.example.com");

        assert_eq!(
            PriorityRules.check(&RequestTarget::parse("https://doubleclick.net./x").unwrap()),
            Some(BlockReason::CriticalDomain("doubleclick.net"))
        );
    }

    #[test]
    fn test_suffix_boundary() {
        assert!(is_same_or_subdomain("doubleclick.net", "doubleclick.net"));
        assert!(is_same_or_subdomain("ad.doubleclick.net", "doubleclick.net"));
        assert!(!is_same_or_subdomain("notdoubleclick.net", "doubleclick.net"));
        assert!(!is_same_or_subdomain("net", "doubleclick.net"));
    }

    #[test]
    fn test_priority_rules() {
        let rules = PriorityRules;
        let check = |url: &str| rules.check(&RequestTarget::parse(url).unwrap());

        assert_eq!(
            check("https://stats.g.doubleclick.net/x"),
            Some(BlockReason::CriticalDomain("doubleclick.net"))
        );
        assert_eq!(
            check("https://shop.example.com/item?gclid=abc"),
            Some(BlockReason::CriticalMarker("gclid="))
        );
        assert_eq!(check("https://news.example.com/story/1"), None);
    }
}
