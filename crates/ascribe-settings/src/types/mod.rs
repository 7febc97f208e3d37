//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`], so partial JSON files only need to name what they change.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Name of the pseudo-user that merges catalogs against their templates.
pub const DEFAULT_MERGE_USER: &str = "fuzzy";

/// Default cap on the separator marker length.
pub const DEFAULT_MAX_SEPARATOR_LENGTH: usize = 64;

/// A known translator or reviewer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserData {
    /// Display name, in the team language.
    pub name: String,
    /// Name in the user's original script, when it differs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    /// Contact address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Root settings for an ascription run.
///
/// ```json
/// {
///   "users": { "alice": { "name": "Alice Liddell", "email": "alice@example.org" } },
///   "reviewTags": ["grammar", "terms"],
///   "catalogRoot": "po",
///   "ascriptionRoot": "po-ascript"
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AscribeSettings {
    /// Known users by id.
    pub users: BTreeMap<String, UserData>,
    /// Known review tags. The empty tag is always implied.
    pub review_tags: BTreeSet<String>,
    /// Reserved id of the merge pseudo-user.
    pub merge_user: String,
    /// Root of the translation catalogs.
    pub catalog_root: PathBuf,
    /// Root of the shadow ascription catalogs, mirroring `catalog_root`.
    pub ascription_root: PathBuf,
    /// Project title for shadow catalog headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Team name for shadow catalog headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_team: Option<String>,
    /// Team address for shadow catalog headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_email: Option<String>,
    /// Language code for shadow catalog headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Plural-Forms header value for shadow catalogs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plural_header: Option<String>,
    /// Longest separator marker tried before giving up.
    pub max_separator_length: usize,
    /// Similarity below which a review diff is not embedded.
    pub min_adjusted_similarity: f64,
}

impl Default for AscribeSettings {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            review_tags: BTreeSet::new(),
            merge_user: DEFAULT_MERGE_USER.to_string(),
            catalog_root: PathBuf::from("po"),
            ascription_root: PathBuf::from("po-ascript"),
            title: None,
            language_team: None,
            team_email: None,
            language: None,
            plural_header: None,
            max_separator_length: DEFAULT_MAX_SEPARATOR_LENGTH,
            min_adjusted_similarity: 0.0,
        }
    }
}

impl AscribeSettings {
    /// Check user and root invariants, clamping soft values.
    ///
    /// Called automatically during loading. An out-of-range similarity is
    /// clamped with a warning; user problems are errors.
    pub fn validate(&mut self) -> Result<()> {
        if self.merge_user.trim().is_empty() {
            return Err(SettingsError::InvalidValue("merge user id is empty".into()));
        }
        for (id, data) in &self.users {
            if id.trim().is_empty() {
                return Err(SettingsError::InvalidValue("empty user id".into()));
            }
            if id.contains(|c: char| c.is_whitespace() || c == ',' || c == '|') {
                return Err(SettingsError::InvalidValue(format!(
                    "user id '{id}' contains a separator character"
                )));
            }
            if *id == self.merge_user || data.name == self.merge_user {
                return Err(SettingsError::InvalidValue(format!(
                    "user '{}' is reserved",
                    self.merge_user
                )));
            }
            if data.name.trim().is_empty() {
                return Err(SettingsError::InvalidValue(format!(
                    "user '{id}' misses the name"
                )));
            }
        }
        if self.catalog_root == self.ascription_root {
            return Err(SettingsError::InvalidValue(format!(
                "catalog root and ascription root resolve to the same path: {}",
                self.catalog_root.display()
            )));
        }
        if self.max_separator_length == 0 {
            tracing::warn!("max_separator_length is 0, using 1");
            self.max_separator_length = 1;
        }
        if !(0.0..=1.0).contains(&self.min_adjusted_similarity) {
            let clamped = self.min_adjusted_similarity.clamp(0.0, 1.0);
            tracing::warn!(
                "min_adjusted_similarity out of range ({}), clamped to {clamped}",
                self.min_adjusted_similarity
            );
            self.min_adjusted_similarity = clamped;
        }
        Ok(())
    }

    /// Whether `user` may appear in ascriptions (configured or merge user).
    pub fn is_known_user(&self, user: &str) -> bool {
        user == self.merge_user || self.users.contains_key(user)
    }

    /// Whether `user` is the merge pseudo-user.
    pub fn is_merge_user(&self, user: &str) -> bool {
        user == self.merge_user
    }

    /// All user ids, including the merge pseudo-user.
    pub fn all_users(&self) -> BTreeSet<String> {
        let mut users: BTreeSet<String> = self.users.keys().cloned().collect();
        let _ = users.insert(self.merge_user.clone());
        users
    }

    /// Known review tags, including the empty tag.
    pub fn all_review_tags(&self) -> BTreeSet<String> {
        let mut tags = self.review_tags.clone();
        let _ = tags.insert(String::new());
        tags
    }

    /// Whether `tag` is a known review tag (the empty tag always is).
    pub fn is_known_tag(&self, tag: &str) -> bool {
        tag.is_empty() || self.review_tags.contains(tag)
    }

    /// Stable identity of these settings, used to key per-run caches.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        serde_json::to_string(self)
            .unwrap_or_default()
            .hash(&mut hasher);
        hasher.finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn with_user(id: &str, name: &str) -> AscribeSettings {
        let mut s = AscribeSettings::default();
        let _ = s.users.insert(
            id.to_string(),
            UserData {
                name: name.to_string(),
                ..UserData::default()
            },
        );
        s
    }

    #[test]
    fn defaults() {
        let s = AscribeSettings::default();
        assert_eq!(s.merge_user, "fuzzy");
        assert_eq!(s.max_separator_length, 64);
        assert!(s.min_adjusted_similarity.abs() < f64::EPSILON);
        assert!(s.users.is_empty());
    }

    #[test]
    fn merge_user_always_known() {
        let s = with_user("alice", "Alice");
        assert!(s.is_known_user("alice"));
        assert!(s.is_known_user("fuzzy"));
        assert!(!s.is_known_user("bob"));
        assert_eq!(
            s.all_users().into_iter().collect::<Vec<_>>(),
            ["alice", "fuzzy"]
        );
    }

    #[test]
    fn empty_tag_always_known() {
        let mut s = AscribeSettings::default();
        let _ = s.review_tags.insert("terms".into());
        assert!(s.is_known_tag(""));
        assert!(s.is_known_tag("terms"));
        assert!(!s.is_known_tag("style"));
        assert!(s.all_review_tags().contains(""));
    }

    #[test]
    fn validate_rejects_reserved_user() {
        let mut s = with_user("fuzzy", "Someone");
        assert_matches!(s.validate(), Err(SettingsError::InvalidValue(m)) if m.contains("reserved"));
    }

    #[test]
    fn validate_rejects_missing_name() {
        let mut s = with_user("alice", "  ");
        assert_matches!(s.validate(), Err(SettingsError::InvalidValue(m)) if m.contains("misses the name"));
    }

    #[test]
    fn validate_rejects_separator_in_id() {
        let mut s = with_user("al ice", "Alice");
        assert_matches!(s.validate(), Err(SettingsError::InvalidValue(_)));
    }

    #[test]
    fn validate_rejects_same_roots() {
        let mut s = AscribeSettings::default();
        s.ascription_root = s.catalog_root.clone();
        assert_matches!(s.validate(), Err(SettingsError::InvalidValue(m)) if m.contains("same path"));
    }

    #[test]
    fn validate_clamps_similarity() {
        let mut s = with_user("alice", "Alice");
        s.min_adjusted_similarity = 1.5;
        s.validate().unwrap();
        assert!((s.min_adjusted_similarity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = with_user("alice", "Alice");
        let b = with_user("alice", "Alice");
        assert_eq!(a.fingerprint(), b.fingerprint());
        let c = with_user("bob", "Bob");
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn serde_camel_case() {
        let json = serde_json::to_value(AscribeSettings::default()).unwrap();
        assert_eq!(json["mergeUser"], "fuzzy");
        assert_eq!(json["maxSeparatorLength"], 64);
        assert!(json.get("teamEmail").is_none());
    }
}
