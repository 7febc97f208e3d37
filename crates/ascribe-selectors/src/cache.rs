//! Run-scoped memoization of parsed selector arguments.
//!
//! Many selectors in one run share the same user lists, tag lists and
//! expressions. Parsed values are kept per (kind, argument, settings
//! fingerprint) so a settings change never serves stale sets.

use std::collections::HashMap;
use std::sync::Arc;

use ascribe_settings::AscribeSettings;
use parking_lot::Mutex;

use crate::errors::{Result, SelectorError};
use crate::matcher::Matcher;
use crate::sets::{TagSet, UserSet, parse_tags, parse_users};

type CacheKey = (&'static str, String, u64);

/// Parsed argument cache for one run.
#[derive(Debug, Default)]
pub struct SelectorCache {
    users: Mutex<HashMap<CacheKey, Arc<UserSet>>>,
    tags: Mutex<HashMap<CacheKey, Arc<TagSet>>>,
    matchers: Mutex<HashMap<CacheKey, Arc<Matcher>>>,
}

fn get_or_try_insert<T, F>(map: &Mutex<HashMap<CacheKey, Arc<T>>>, key: CacheKey, build: F) -> Result<Arc<T>>
where
    F: FnOnce() -> Result<T>,
{
    if let Some(hit) = map.lock().get(&key) {
        return Ok(Arc::clone(hit));
    }
    let value = Arc::new(build()?);
    let mut guard = map.lock();
    Ok(Arc::clone(guard.entry(key).or_insert(value)))
}

impl SelectorCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parsed user list for `selector`.
    pub fn users(&self, spec: &str, settings: &AscribeSettings, selector: &str) -> Result<Arc<UserSet>> {
        let key = ("users", spec.to_owned(), settings.fingerprint());
        get_or_try_insert(&self.users, key, || {
            parse_users(spec, settings).map_err(|user| SelectorError::UnknownUser {
                selector: selector.to_owned(),
                user,
            })
        })
    }

    /// Parsed tag list for `selector`.
    pub fn tags(&self, spec: &str, settings: &AscribeSettings, selector: &str) -> Result<Arc<TagSet>> {
        let key = ("tags", spec.to_owned(), settings.fingerprint());
        get_or_try_insert(&self.tags, key, || {
            parse_tags(spec, settings).map_err(|tag| SelectorError::UnknownTag {
                selector: selector.to_owned(),
                tag,
            })
        })
    }

    /// Compiled matching expression for `selector`.
    pub fn matcher(&self, expr: &str, selector: &str) -> Result<Arc<Matcher>> {
        // Expressions do not read settings, so the fingerprint slot stays 0.
        let key = ("matcher", expr.to_owned(), 0);
        get_or_try_insert(&self.matchers, key, || {
            Matcher::parse(expr).map_err(|source| SelectorError::BadExpression {
                selector: selector.to_owned(),
                source,
            })
        })
    }

    /// Number of cached entries of all kinds.
    pub fn len(&self) -> usize {
        self.users.lock().len() + self.tags.lock().len() + self.matchers.lock().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use ascribe_settings::UserData;

    use super::*;

    fn settings() -> AscribeSettings {
        let mut s = AscribeSettings::default();
        let _ = s.users.insert(
            "alice".into(),
            UserData {
                name: "Alice".into(),
                ..UserData::default()
            },
        );
        s
    }

    #[test]
    fn repeated_lookups_share_one_value() {
        let cache = SelectorCache::new();
        let s = settings();
        let a = cache.users("alice", &s, "mod").unwrap();
        let b = cache.users("alice", &s, "asc").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn settings_change_is_a_new_key() {
        let cache = SelectorCache::new();
        let s = settings();
        let _ = cache.users("~alice", &s, "mod").unwrap();
        let mut changed = s.clone();
        changed.merge_user = "merger".into();
        let set = cache.users("~alice", &changed, "mod").unwrap();
        assert!(set.allows(Some("merger")));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache = SelectorCache::new();
        assert_matches!(
            cache.users("carol", &settings(), "mod"),
            Err(SelectorError::UnknownUser { user, .. }) if user == "carol"
        );
        assert_matches!(cache.matcher("msgid/(/", "fexpr"), Err(SelectorError::BadExpression { .. }));
        assert!(cache.is_empty());
    }
}
