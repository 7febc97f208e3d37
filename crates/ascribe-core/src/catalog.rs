//! Ordered, key-indexed message collection.
//!
//! Parsing and writing catalog files is the job of an outer layer; this type
//! only holds the messages in file order and answers lookups by identity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::message::{Message, MessageKey};

/// A translation catalog.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    name: String,
    path: PathBuf,
    messages: Vec<Message>,
    index: HashMap<MessageKey, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            messages: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create a catalog from messages in file order.
    ///
    /// A later message with an already-seen key replaces the earlier one.
    pub fn from_messages(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        messages: impl IntoIterator<Item = Message>,
    ) -> Self {
        let mut cat = Self::new(name, path);
        for msg in messages {
            cat.push(msg);
        }
        cat
    }

    /// Catalog name (file stem).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catalog file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a message, or replace the one with the same key.
    pub fn push(&mut self, msg: Message) {
        let key = msg.key();
        if let Some(&i) = self.index.get(&key) {
            self.messages[i] = msg;
        } else {
            let _ = self.index.insert(key, self.messages.len());
            self.messages.push(msg);
        }
    }

    /// Look up a message by identity.
    pub fn get(&self, key: &MessageKey) -> Option<&Message> {
        self.index.get(key).map(|&i| &self.messages[i])
    }

    /// Whether a message with this identity exists.
    pub fn contains(&self, key: &MessageKey) -> bool {
        self.index.contains_key(key)
    }

    /// Messages in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    /// Apply `f` to every message in file order.
    ///
    /// Identity fields must not be changed by `f`.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut Message)) {
        for msg in &mut self.messages {
            f(msg);
        }
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the catalog has no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_key() {
        let cat = Catalog::from_messages(
            "app",
            "po/app.po",
            [
                Message::new("Open"),
                Message::new("Open").with_context("menu"),
            ],
        );
        assert_eq!(cat.len(), 2);
        assert!(cat.contains(&MessageKey::new(Some("menu"), "Open")));
        assert!(cat.get(&MessageKey::new(None, "Close")).is_none());
    }

    #[test]
    fn push_replaces_same_key() {
        let mut cat = Catalog::new("app", "app.po");
        cat.push(Message::new("Open"));
        cat.push(Message::new("Open").with_translation("Otvori"));
        assert_eq!(cat.len(), 1);
        let msg = cat.get(&MessageKey::new(None, "Open")).unwrap();
        assert_eq!(msg.msgstr, ["Otvori"]);
    }

    #[test]
    fn iteration_keeps_file_order() {
        let cat = Catalog::from_messages(
            "app",
            "app.po",
            ["b", "a", "c"].into_iter().map(Message::new),
        );
        let ids: Vec<_> = cat.iter().map(|m| m.msgid.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(cat.path(), Path::new("app.po"));
    }
}
