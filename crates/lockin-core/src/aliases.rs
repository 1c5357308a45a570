//! Alias table: equivalence classes of interchangeable hosts

use lockin_api::Domain;
use lockin_config::AliasConfig;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Groups shipped with the service
const BUILTIN_GROUPS: &[&[&str]] = &[
    &["mail.google.com", "gmail.com"],
    &["google.com", "www.google.com"],
    &["drive.google.com", "docs.google.com"],
    &["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"],
    &["twitter.com", "x.com", "mobile.twitter.com"],
    &["facebook.com", "www.facebook.com", "m.facebook.com", "fb.com"],
    &["instagram.com", "www.instagram.com"],
    &["linkedin.com", "www.linkedin.com"],
    &["reddit.com", "www.reddit.com", "old.reddit.com"],
    &["tiktok.com", "www.tiktok.com"],
    &["outlook.office.com", "outlook.live.com", "outlook.com"],
    &["office.com", "www.office.com", "office365.com"],
    &["teams.microsoft.com", "teams.live.com"],
    &["github.com", "www.github.com", "gist.github.com"],
    &["stackoverflow.com", "www.stackoverflow.com"],
    &["gitlab.com", "www.gitlab.com"],
    &["bitbucket.org", "www.bitbucket.org"],
    &["notion.so", "www.notion.so"],
    &["trello.com", "www.trello.com"],
    &["slack.com", "app.slack.com"],
    &["discord.com", "www.discord.com", "discordapp.com"],
    &["zoom.us", "www.zoom.us"],
    &["medium.com", "www.medium.com"],
    &["substack.com", "www.substack.com"],
    &["amazon.com", "www.amazon.com"],
    &["ebay.com", "www.ebay.com"],
    &["netflix.com", "www.netflix.com"],
    &["spotify.com", "open.spotify.com"],
    &["twitch.tv", "www.twitch.tv"],
    &["dropbox.com", "www.dropbox.com"],
    &["onedrive.live.com", "onedrive.com"],
    &["web.whatsapp.com", "whatsapp.com"],
    &["web.telegram.org", "telegram.org"],
];

/// Many-to-many host equivalence index
///
/// Every domain belongs to at most one class. Adding a group that shares a
/// member with existing classes merges them, so membership stays symmetric
/// and `expand` returns the same set for every member of a class.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    classes: Vec<BTreeSet<Domain>>,
    index: HashMap<Domain, usize>,
}

impl AliasTable {
    /// A table with no groups; every domain expands to itself
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in groups
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for group in BUILTIN_GROUPS {
            table.add_group(group.iter().filter_map(|d| Domain::parse(d).ok()));
        }
        table
    }

    /// Build from configuration: built-ins (unless disabled) plus extra groups
    pub fn from_config(config: &AliasConfig) -> Self {
        let mut table = if config.include_builtin {
            Self::builtin()
        } else {
            Self::empty()
        };
        for group in &config.groups {
            table.add_group(group.iter().cloned());
        }
        debug!(classes = table.class_count(), "Alias table built");
        table
    }

    /// Build from explicit groups, merging any that overlap
    pub fn from_groups<G, I>(groups: G) -> Self
    where
        G: IntoIterator<Item = I>,
        I: IntoIterator<Item = Domain>,
    {
        let mut table = Self::empty();
        for group in groups {
            table.add_group(group);
        }
        table
    }

    /// Add a group, merging it with every class it touches
    pub fn add_group(&mut self, members: impl IntoIterator<Item = Domain>) {
        let mut merged: BTreeSet<Domain> = members.into_iter().collect();
        if merged.len() < 2 {
            if !merged.is_empty() {
                warn!("Ignoring alias group with a single domain");
            }
            return;
        }

        let mut touched: Vec<usize> = merged
            .iter()
            .filter_map(|d| self.index.get(d).copied())
            .collect();
        touched.sort_unstable();
        touched.dedup();

        for &i in &touched {
            merged.append(&mut self.classes[i]);
        }

        let slot = match touched.first() {
            Some(&i) => i,
            None => {
                self.classes.push(BTreeSet::new());
                self.classes.len() - 1
            }
        };

        for domain in &merged {
            self.index.insert(domain.clone(), slot);
        }
        self.classes[slot] = merged;
    }

    /// The class containing `domain`, if it has aliases
    pub fn class_of(&self, domain: &Domain) -> Option<&BTreeSet<Domain>> {
        self.index.get(domain).map(|&i| &self.classes[i])
    }

    /// Every host equivalent to `domain`, including itself
    pub fn expand(&self, domain: &Domain) -> BTreeSet<Domain> {
        match self.class_of(domain) {
            Some(class) => class.clone(),
            None => BTreeSet::from([domain.clone()]),
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.iter().filter(|c| !c.is_empty()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<Domain> {
        items.iter().map(|s| d(s)).collect()
    }

    #[test]
    fn builtin_table_has_all_groups() {
        assert_eq!(AliasTable::builtin().class_count(), BUILTIN_GROUPS.len());
    }

    #[test]
    fn every_member_expands_to_its_group() {
        let table = AliasTable::builtin();
        for group in BUILTIN_GROUPS {
            let expected = set(group);
            for member in *group {
                assert_eq!(table.expand(&d(member)), expected, "member {}", member);
            }
        }
    }

    #[test]
    fn unknown_domain_expands_to_itself() {
        let table = AliasTable::builtin();
        assert_eq!(table.expand(&d("example.org")), set(&["example.org"]));
    }

    #[test]
    fn overlapping_groups_merge() {
        let table = AliasTable::from_groups([
            vec![d("a.example"), d("b.example")],
            vec![d("c.example"), d("d.example")],
            vec![d("b.example"), d("c.example"), d("e.example")],
        ]);

        let all = set(&["a.example", "b.example", "c.example", "d.example", "e.example"]);
        assert_eq!(table.class_count(), 1);
        assert_eq!(table.expand(&d("a.example")), all);
        assert_eq!(table.expand(&d("d.example")), all);
    }

    #[test]
    fn config_can_drop_builtins() {
        let config = AliasConfig {
            include_builtin: false,
            groups: vec![vec![d("example.com"), d("www.example.com")]],
        };
        let table = AliasTable::from_config(&config);

        assert_eq!(table.class_count(), 1);
        assert_eq!(table.expand(&d("youtu.be")), set(&["youtu.be"]));
        assert_eq!(
            table.expand(&d("www.example.com")),
            set(&["example.com", "www.example.com"])
        );
    }

    #[test]
    fn config_groups_extend_builtins() {
        let config = AliasConfig {
            include_builtin: true,
            groups: vec![vec![d("github.com"), d("github.io")]],
        };
        let table = AliasTable::from_config(&config);

        assert!(table.expand(&d("github.io")).contains(&d("gist.github.com")));
        assert_eq!(table.class_count(), BUILTIN_GROUPS.len());
    }
}
