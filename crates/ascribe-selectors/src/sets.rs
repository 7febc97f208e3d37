//! User and review tag sets given as selector arguments.
//!
//! Both are comma-separated lists; spaces are ignored and a leading `~`
//! selects everything configured except the listed names.

use std::collections::BTreeSet;

use ascribe_settings::AscribeSettings;

/// A set of users, or no restriction at all.
///
/// An empty argument means any user. An inverted list that leaves nobody
/// matches no user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserSet(Option<BTreeSet<String>>);

impl UserSet {
    /// No restriction.
    pub const ANY: Self = Self(None);

    /// Whether `user` is in the set, or the set is unrestricted.
    pub fn allows(&self, user: Option<&str>) -> bool {
        match &self.0 {
            None => true,
            Some(users) => user.is_some_and(|u| users.contains(u)),
        }
    }

    /// Whether `user` is outside the set, or the set is unrestricted.
    pub fn spares(&self, user: Option<&str>) -> bool {
        match &self.0 {
            None => true,
            Some(users) => !user.is_some_and(|u| users.contains(u)),
        }
    }

    /// Whether the set restricts anything.
    pub fn is_restricted(&self) -> bool {
        self.0.is_some()
    }
}

/// A set of review tags. Never empty: no argument means the untagged review.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    /// Whether `tag` is in the set.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }
}

impl Default for TagSet {
    fn default() -> Self {
        Self(BTreeSet::from([String::new()]))
    }
}

/// Parse a comma list against `known`, returning the first unknown name on failure.
fn parse_fixed_set(spec: &str, known: &BTreeSet<String>) -> Result<Option<BTreeSet<String>>, String> {
    let compact: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(None);
    }
    let (inverted, list) = match compact.strip_prefix('~') {
        Some(rest) => (true, rest),
        None => (false, compact.as_str()),
    };
    let listed: BTreeSet<String> = list
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    if let Some(unknown) = listed.iter().find(|name| !known.contains(*name)) {
        return Err(unknown.clone());
    }
    Ok(Some(if inverted {
        known.difference(&listed).cloned().collect()
    } else {
        listed
    }))
}

/// Parse a user list. `Err` carries the first unknown user.
pub fn parse_users(spec: &str, settings: &AscribeSettings) -> Result<UserSet, String> {
    parse_fixed_set(spec, &settings.all_users()).map(UserSet)
}

/// Parse a tag list. `Err` carries the first unknown tag.
pub fn parse_tags(spec: &str, settings: &AscribeSettings) -> Result<TagSet, String> {
    match parse_fixed_set(spec, &settings.review_tags)? {
        Some(tags) if !tags.is_empty() => Ok(TagSet(tags)),
        _ => Ok(TagSet::default()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
