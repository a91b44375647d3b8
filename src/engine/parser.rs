//! Line-oriented filter list parsing.
//!
//! Lists are not declared as hosts-file, EasyList or wildcard up front; every
//! line is classified on its own, first match wins.

/// Output of one parsed list: domains plus regex sources still to be compiled.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedList {
    pub domains: Vec<String>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEntry {
    Domain(String),
    Pattern(String),
}

pub fn parse_filter_list(text: &str) -> ParsedList {
    let mut parsed = ParsedList::default();
    for line in text.lines() {
        match parse_line(line) {
            Some(FilterEntry::Domain(d)) => parsed.domains.push(d),
            Some(FilterEntry::Pattern(p)) => parsed.patterns.push(p),
            None => {}
        }
    }
    parsed
}

pub fn parse_line(line: &str) -> Option<FilterEntry> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(['!', '#', '[']) {
        return None;
    }

    // ||domain.tld^options
    if let Some(rest) = line.strip_prefix("||") {
        if let Some(end) = rest.find('^') {
            let domain = &rest[..end];
            return is_valid_domain(domain).then(|| FilterEntry::Domain(domain.to_lowercase()));
        }
    }

    // 0.0.0.0 domain.tld
    if line.starts_with("0.0.0.0") || line.starts_with("127.0.0.1") {
        return line
            .split_whitespace()
            .nth(1)
            .filter(|d| is_valid_domain(d))
            .map(|d| FilterEntry::Domain(d.to_lowercase()));
    }

    if line.contains(['*', '?']) {
        return Some(FilterEntry::Pattern(wildcard_to_regex(line)));
    }

    None
}

/// The user override file: `0.0.0.0 domain` or a bare `domain` per line.
pub fn parse_override_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| {
            let mut parts = l.split_whitespace();
            let first = parts.next()?;
            let domain = parts.next().unwrap_or(first);
            domain.contains('.').then(|| domain.to_lowercase())
        })
        .collect()
}

pub fn is_valid_domain(domain: &str) -> bool {
    domain.len() > 3 && domain.contains('.') && !domain.contains(char::is_whitespace)
}

/// Converts an Adblock-style wildcard rule into a regex anchored at the start.
///
/// `*` matches any sequence, `^` a separator character and `|` a word
/// boundary. Every other character, including `?`, is literal.
pub fn wildcard_to_regex(rule: &str) -> String {
    let escaped = regex::escape(rule)
        .replace(r"\*", ".*")
        .replace(r"\^", r"[^\w\-.%]")
        .replace(r"\|", r"\b");
    format!("^{escaped}")
}
