//! Allow-list parsing and expansion

use lockin_api::{Domain, DomainError};
use std::collections::BTreeSet;

use crate::AliasTable;

/// Deduplicated, sorted set of allowed hosts
pub type ExpandedAllowlist = BTreeSet<Domain>;

/// Normalize every raw entry, failing on the first malformed one
pub fn parse_allowlist<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Domain>, DomainError> {
    raw.iter().map(|entry| Domain::parse(entry.as_ref())).collect()
}

/// Union of the alias expansion of every entry
pub fn expand_allowlist(table: &AliasTable, domains: &[Domain]) -> ExpandedAllowlist {
    domains.iter().flat_map(|d| table.expand(d)).collect()
}

/// Parse then expand, skipping malformed entries
///
/// Used for stored allow-lists, which were validated when written.
pub fn expand_stored(table: &AliasTable, raw: &[String]) -> ExpandedAllowlist {
    let domains: Vec<Domain> = raw.iter().filter_map(|r| Domain::parse(r).ok()).collect();
    expand_allowlist(table, &domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_normalized() {
        let parsed = parse_allowlist(&["https://GitHub.com/", " notion.so "]).unwrap();
        let names: Vec<&str> = parsed.iter().map(|d| d.as_str()).collect();
        assert_eq!(names, vec!["github.com", "notion.so"]);
    }

    #[test]
    fn malformed_entry_rejected() {
        assert!(parse_allowlist(&["github.com", "not a host"]).is_err());
        assert!(parse_allowlist(&[""]).is_err());
    }

    #[test]
    fn empty_allowlist_expands_to_nothing() {
        let table = AliasTable::builtin();
        assert!(expand_allowlist(&table, &[]).is_empty());
    }

    #[test]
    fn expansion_is_order_independent_and_deduplicated() {
        let table = AliasTable::builtin();
        let a = parse_allowlist(&["youtu.be", "github.com", "youtube.com"]).unwrap();
        let b = parse_allowlist(&["github.com", "www.youtube.com"]).unwrap();

        let expanded = expand_allowlist(&table, &a);
        assert_eq!(expanded, expand_allowlist(&table, &b));
        assert_eq!(expanded.len(), 7);
    }
}
