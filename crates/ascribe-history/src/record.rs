//! Ascription records and the shadow catalog that holds them.
//!
//! A record is stored as an ordinary catalog message with the identity of
//! the message it describes: the ascription lines go into its automatic
//! comments, and each tracked field holds that field's codec blobs instead
//! of text. The state markers (fuzzy, obsolete) mirror the newest write.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use ascribe_core::time::{Timestamp, format_timestamp};
use ascribe_core::{Catalog, Message, MessageKey, TrackedField};
use ascribe_settings::AscribeSettings;

/// Translator name written into shadow catalog headers.
pub const SHADOW_TRANSLATOR: &str = "Ascriber";

/// Ascription lines and field blobs for one message identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AscriptionRecord {
    key: MessageKey,
    /// Raw ascription lines, in file order.
    pub lines: Vec<String>,
    blobs: BTreeMap<TrackedField, Vec<String>>,
    /// Whether the newest write was fuzzy.
    pub fuzzy: bool,
    /// Whether the newest write was obsolete.
    pub obsolete: bool,
}

impl AscriptionRecord {
    /// An empty record for `key`.
    pub fn new(key: MessageKey) -> Self {
        Self {
            key,
            lines: Vec::new(),
            blobs: BTreeMap::new(),
            fuzzy: false,
            obsolete: false,
        }
    }

    /// Identity of the described message.
    pub fn key(&self) -> &MessageKey {
        &self.key
    }

    /// Blobs of a field, one per item.
    pub fn blobs(&self, field: TrackedField) -> &[String] {
        self.blobs.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Mutable blobs of a field.
    pub fn blobs_mut(&mut self, field: TrackedField) -> &mut Vec<String> {
        self.blobs.entry(field).or_default()
    }

    /// Persistable form: a message carrying lines and blobs.
    pub fn to_message(&self) -> Message {
        let mut msg = Message::from_key(&self.key);
        for field in TrackedField::ALL {
            msg.set_sequence(field, self.blobs(field).to_vec());
        }
        msg.auto_comment.clone_from(&self.lines);
        msg.set_fuzzy(self.fuzzy);
        msg.obsolete = self.obsolete;
        msg
    }

    /// Rebuild from the persisted form.
    ///
    /// A field whose items are all empty has never been written.
    pub fn from_message(msg: &Message) -> Self {
        let mut record = Self::new(msg.key());
        for field in TrackedField::ALL {
            let items = msg.sequence(field);
            if items.iter().any(|b| !b.is_empty()) {
                let _ = record.blobs.insert(field, items);
            }
        }
        record.lines.clone_from(&msg.auto_comment);
        record.fuzzy = msg.is_fuzzy();
        record.obsolete = msg.obsolete;
        record
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Header
// ─────────────────────────────────────────────────────────────────────────────

/// Header of a shadow catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShadowHeader {
    /// Title comment.
    pub title: String,
    /// Author comment.
    pub author: String,
    /// Free comment lines.
    pub comment: Vec<String>,
    /// Header fields, in order.
    pub fields: Vec<(String, String)>,
}

impl ShadowHeader {
    /// Header for a new shadow of catalog `name`.
    pub fn for_catalog(name: &str, settings: &AscribeSettings, now: &Timestamp) -> Self {
        let with_email = |who: &str| match &settings.team_email {
            Some(email) => format!("{who} <{email}>"),
            None => who.to_owned(),
        };

        let mut fields = vec![
            ("Project-Id-Version".to_owned(), name.to_owned()),
            (
                "Report-Msgid-Bugs-To".to_owned(),
                settings.team_email.clone().unwrap_or_default(),
            ),
            ("PO-Revision-Date".to_owned(), format_timestamp(now)),
            ("Last-Translator".to_owned(), with_email(SHADOW_TRANSLATOR)),
        ];
        if let Some(team) = &settings.language_team {
            fields.push(("Language-Team".to_owned(), with_email(team)));
        }
        if let Some(lang) = &settings.language {
            fields.push(("Language".to_owned(), lang.clone()));
        }
        fields.push((
            "Content-Type".to_owned(),
            "text/plain; charset=UTF-8".to_owned(),
        ));
        fields.push(("Content-Transfer-Encoding".to_owned(), "8bit".to_owned()));
        if let Some(plural) = &settings.plural_header {
            fields.push(("Plural-Forms".to_owned(), plural.clone()));
        }

        Self {
            title: format!("Ascription shadow for {name}.po"),
            author: with_email(SHADOW_TRANSLATOR),
            comment: vec!["===== DO NOT EDIT MANUALLY =====".to_owned()],
            fields,
        }
    }

    /// Value of a header field.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or append a header field.
    pub fn set_field(&mut self, name: &str, value: String) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_owned(), value)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shadow catalog
// ─────────────────────────────────────────────────────────────────────────────

/// All ascription records of one catalog.
#[derive(Clone, Debug)]
pub struct AscriptionCatalog {
    name: String,
    path: PathBuf,
    header: ShadowHeader,
    records: Vec<AscriptionRecord>,
    index: HashMap<MessageKey, usize>,
    dirty: bool,
}

impl AscriptionCatalog {
    /// A new, empty shadow catalog with a header built from `settings`.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        settings: &AscribeSettings,
        now: &Timestamp,
    ) -> Self {
        let name = name.into();
        let header = ShadowHeader::for_catalog(&name, settings, now);
        Self::with_header(name, path, header)
    }

    /// An empty shadow catalog with the given header.
    pub fn with_header(name: impl Into<String>, path: impl Into<PathBuf>, header: ShadowHeader) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            header,
            records: Vec::new(),
            index: HashMap::new(),
            dirty: false,
        }
    }

    /// Load records from a parsed shadow catalog.
    pub fn from_catalog(catalog: &Catalog, header: ShadowHeader) -> Self {
        let mut acat = Self::with_header(catalog.name(), catalog.path(), header);
        for msg in catalog {
            let record = AscriptionRecord::from_message(msg);
            let _ = acat.index.insert(record.key().clone(), acat.records.len());
            acat.records.push(record);
        }
        acat
    }

    /// Persistable form of all records, in file order.
    pub fn to_catalog(&self) -> Catalog {
        Catalog::from_messages(
            self.name.clone(),
            self.path.clone(),
            self.records.iter().map(AscriptionRecord::to_message),
        )
    }

    /// Catalog name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header.
    pub fn header(&self) -> &ShadowHeader {
        &self.header
    }

    /// Record for an identity.
    pub fn get(&self, key: &MessageKey) -> Option<&AscriptionRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    /// Whether a record exists for an identity.
    pub fn contains(&self, key: &MessageKey) -> bool {
        self.index.contains_key(key)
    }

    /// Record for an identity, created empty at the end if missing.
    pub fn ensure(&mut self, key: &MessageKey) -> &mut AscriptionRecord {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                let i = self.records.len();
                self.records.push(AscriptionRecord::new(key.clone()));
                let _ = self.index.insert(key.clone(), i);
                self.dirty = true;
                i
            }
        };
        &mut self.records[i]
    }

    /// Records in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, AscriptionRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether anything changed since loading.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark as changed and bump the revision date.
    pub fn mark_dirty(&mut self, now: &Timestamp) {
        self.dirty = true;
        self.header
            .set_field("PO-Revision-Date", format_timestamp(now));
    }
}

impl<'a> IntoIterator for &'a AscriptionCatalog {
    type Item = &'a AscriptionRecord;
    type IntoIter = std::slice::Iter<'a, AscriptionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Shadow catalog path for a catalog path, mirroring it under the ascription root.
///
/// Returns `None` when `catalog_path` is not under the catalog root.
pub fn ascription_path(catalog_path: &Path, settings: &AscribeSettings) -> Option<PathBuf> {
    catalog_path
        .strip_prefix(&settings.catalog_root)
        .ok()
        .map(|rel| settings.ascription_root.join(rel))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
