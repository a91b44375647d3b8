use super::matcher::{BlockReason, RequestTarget};
use super::parser::ParsedList;
use super::traits::RuleMatcher;
use arc_swap::ArcSwap;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Immutable snapshot of every blocked domain and compiled pattern.
#[derive(Debug, Default, Clone)]
pub struct RuleSet {
    domains: FxHashSet<Box<str>>,
    patterns: Vec<Regex>,
    /// Sources of `patterns`; a pattern is stored once however often its
    /// list is reloaded.
    pattern_sources: FxHashSet<Box<str>>,
}

impl RuleSet {
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn contains_domain(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    fn insert_pattern(&mut self, re: &Regex) {
        if self.pattern_sources.insert(re.as_str().into()) {
            self.patterns.push(re.clone());
        }
    }

    /// Walks the parent domains of `host` (not `host` itself) looking for a
    /// blocked entry.
    fn blocked_parent<'a>(&self, host: &'a str) -> Option<&'a str> {
        let mut part = host;
        while let Some(idx) = part.find('.') {
            part = &part[idx + 1..];
            if part.is_empty() {
                break;
            }
            if self.domains.contains(part) {
                return Some(part);
            }
        }
        None
    }
}

impl RuleMatcher for RuleSet {
    fn check(&self, target: &RequestTarget) -> Option<BlockReason> {
        if !target.host.is_empty() {
            if self.domains.contains(target.host.as_str()) {
                return Some(BlockReason::Domain);
            }
            if let Some(parent) = self.blocked_parent(&target.host) {
                return Some(BlockReason::Subdomain(parent.to_string()));
            }
        }

        self.patterns
            .iter()
            .find(|re| re.is_match(&target.url))
            .map(|re| BlockReason::Pattern(re.as_str().to_string()))
    }
}

/// A batch of rules compiled off the shared state, applied in one swap.
#[derive(Debug, Default)]
pub struct RuleBatch {
    domains: Vec<Box<str>>,
    patterns: Vec<Regex>,
}

impl RuleBatch {
    /// Compiles every pattern; sources that fail to compile are dropped.
    pub fn compile(parsed: ParsedList) -> Self {
        Self {
            domains: parsed
                .domains
                .into_iter()
                .map(|d| d.to_lowercase().into_boxed_str())
                .collect(),
            patterns: parsed
                .patterns
                .iter()
                .filter_map(|p| compile_pattern(p))
                .collect(),
        }
    }

    pub fn from_tables(domains: &[&str], patterns: &[&str]) -> Self {
        Self::compile(ParsedList {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        })
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

pub fn compile_pattern(source: &str) -> Option<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .ok()
}

/// Shared rule storage.
///
/// Readers take a snapshot with [`RuleStore::load`] and never wait on writers;
/// every mutation clones the current set and swaps the new one in.
#[derive(Debug)]
pub struct RuleStore {
    rules: ArcSwap<RuleSet>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: ArcSwap::from_pointee(RuleSet::default()),
        }
    }

    pub fn load(&self) -> Arc<RuleSet> {
        self.rules.load_full()
    }

    pub fn add_domain(&self, domain: &str) {
        let domain = normalize(domain);
        if domain.is_empty() || self.rules.load().contains_domain(&domain) {
            return;
        }
        self.rules.rcu(|current| {
            let mut next = RuleSet::clone(current);
            next.domains.insert(domain.as_str().into());
            next
        });
    }

    pub fn remove_domain(&self, domain: &str) {
        let domain = normalize(domain);
        if !self.rules.load().contains_domain(&domain) {
            return;
        }
        self.rules.rcu(|current| {
            let mut next = RuleSet::clone(current);
            next.domains.remove(domain.as_str());
            next
        });
    }

    /// Returns `false` when the source does not compile. Adding a pattern
    /// that is already stored is a no-op.
    pub fn add_pattern(&self, source: &str) -> bool {
        let Some(re) = compile_pattern(source) else {
            return false;
        };
        if self.rules.load().pattern_sources.contains(re.as_str()) {
            return true;
        }
        self.rules.rcu(|current| {
            let mut next = RuleSet::clone(current);
            next.insert_pattern(&re);
            next
        });
        true
    }

    pub fn apply(&self, batch: RuleBatch) {
        if batch.domains.is_empty() && batch.patterns.is_empty() {
            return;
        }
        self.rules.rcu(|current| {
            let mut next = RuleSet::clone(current);
            next.domains.extend(batch.domains.iter().cloned());
            for re in &batch.patterns {
                next.insert_pattern(re);
            }
            next
        });
    }

    pub fn domain_count(&self) -> usize {
        self.rules.load().domain_count()
    }

    pub fn pattern_count(&self) -> usize {
        self.rules.load().pattern_count()
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_lowercase()
}
