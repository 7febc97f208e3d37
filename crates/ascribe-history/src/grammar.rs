//! Ascription line grammar.
//!
//! One line per ascription, stored as an automatic comment of the record:
//!
//! ```text
//! <kind>[/<tag>]: <user> | <timestamp>[ | [<digits>][o][f]]
//! ```
//!
//! `<kind>` is `modified` or `reviewed`. The optional trailing block carries
//! the separator length of a field-changing write and the obsolete and fuzzy
//! markers. Modification lines reset the state markers; review lines inherit
//! them from the line before unless they carry their own.

use std::fmt;

use ascribe_core::MessageKey;
use ascribe_core::time::{Timestamp, format_timestamp, parse_timestamp};
use ascribe_settings::AscribeSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KIND_SEP: char = ':';
const TAG_SEP: char = '/';
const FIELD_SEP: char = '|';
const FUZZY_MARK: char = 'f';
const OBSOLETE_MARK: char = 'o';

/// Action kind of an ascription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AscriptionKind {
    /// The message content or state was changed.
    Modification,
    /// The message was reviewed.
    Review,
}

impl AscriptionKind {
    /// Keyword used in ascription lines.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Modification => "modified",
            Self::Review => "reviewed",
        }
    }

    /// One-letter form used in chain comments.
    pub fn short(self) -> &'static str {
        match self {
            Self::Modification => "m",
            Self::Review => "r",
        }
    }

    /// Parse a line keyword.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "modified" => Some(Self::Modification),
            "reviewed" => Some(Self::Review),
            _ => None,
        }
    }
}

impl fmt::Display for AscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The optional trailing block of a line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Trailer {
    /// Marker length of a field-changing write, 0 if no field changed.
    pub separator_length: usize,
    /// Message was obsolete.
    pub obsolete: bool,
    /// Message was fuzzy.
    pub fuzzy: bool,
}

impl Trailer {
    /// Whether rendering would produce an empty block.
    pub fn is_empty(&self) -> bool {
        self.separator_length == 0 && !self.obsolete && !self.fuzzy
    }
}

impl fmt::Display for Trailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.separator_length > 0 {
            write!(f, "{}", self.separator_length)?;
        }
        if self.obsolete {
            write!(f, "{OBSOLETE_MARK}")?;
        }
        if self.fuzzy {
            write!(f, "{FUZZY_MARK}")?;
        }
        Ok(())
    }
}

/// One parsed ascription line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AscriptionLine {
    /// Action kind.
    pub kind: AscriptionKind,
    /// Review tag, empty when untagged.
    pub tag: String,
    /// User id.
    pub user: String,
    /// When the ascription was made.
    pub date: Timestamp,
    /// Trailing block, if present.
    pub trailer: Option<Trailer>,
}

impl fmt::Display for AscriptionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.keyword())?;
        if !self.tag.is_empty() {
            write!(f, "{TAG_SEP}{}", self.tag)?;
        }
        write!(f, "{KIND_SEP} {} {FIELD_SEP} {}", self.user, format_timestamp(&self.date))?;
        if let Some(trailer) = self.trailer.filter(|t| !t.is_empty()) {
            write!(f, " {FIELD_SEP} {trailer}")?;
        }
        Ok(())
    }
}

/// Why a line was rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LineError {
    /// No `:` after the kind.
    #[error("no ascription type")]
    NoKind,
    /// Kind keyword not recognized.
    #[error("unknown ascription type '{0}'")]
    UnknownKind(String),
    /// Not two or three `|`-separated descriptors.
    #[error("wrong number of descriptors")]
    Descriptors,
    /// Empty user.
    #[error("malformed user string")]
    EmptyUser,
    /// User not configured.
    #[error("unknown user '{0}'")]
    UnknownUser(String),
    /// Timestamp not parseable.
    #[error("malformed date string '{0}'")]
    Date(String),
    /// Trailing block with junk besides the markers, or a length above the
    /// configured cap.
    #[error("malformed separator length '{0}'")]
    SeparatorLength(String),
}

/// Parse one ascription line.
pub fn parse_line(line: &str, settings: &AscribeSettings) -> Result<AscriptionLine, LineError> {
    let (head, rest) = line.split_once(KIND_SEP).ok_or(LineError::NoKind)?;
    let (kind, tag) = match head.split_once(TAG_SEP) {
        Some((kind, tag)) => (kind.trim(), tag.trim()),
        None => (head.trim(), ""),
    };
    let kind = AscriptionKind::from_keyword(kind)
        .ok_or_else(|| LineError::UnknownKind(kind.to_owned()))?;

    let parts: Vec<&str> = rest.split(FIELD_SEP).collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(LineError::Descriptors);
    }

    let user = parts[0].trim();
    if user.is_empty() {
        return Err(LineError::EmptyUser);
    }
    if !settings.is_known_user(user) {
        return Err(LineError::UnknownUser(user.to_owned()));
    }

    let date_str = parts[1].trim();
    let date = parse_timestamp(date_str).map_err(|_| LineError::Date(date_str.to_owned()))?;

    let trailer = parts
        .get(2)
        .map(|raw| parse_trailer(raw.trim(), settings.max_separator_length))
        .transpose()?;

    Ok(AscriptionLine {
        kind,
        tag: tag.to_owned(),
        user: user.to_owned(),
        date,
        trailer,
    })
}

fn parse_trailer(raw: &str, cap: usize) -> Result<Trailer, LineError> {
    let mut rest = raw.to_owned();
    let mut take = |mark: char| match rest.find(mark) {
        Some(p) => {
            let _ = rest.remove(p);
            true
        }
        None => false,
    };
    let fuzzy = take(FUZZY_MARK);
    let obsolete = take(OBSOLETE_MARK);
    let separator_length = if rest.is_empty() {
        0
    } else {
        rest.parse::<usize>()
            .ok()
            .filter(|&len| len <= cap)
            .ok_or_else(|| LineError::SeparatorLength(raw.to_owned()))?
    };
    Ok(Trailer {
        separator_length,
        obsolete,
        fuzzy,
    })
}

/// A rejected line, attached to the record it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AscriptionWarning {
    /// Identity of the record.
    pub key: MessageKey,
    /// The offending line.
    pub line: String,
    /// What was wrong.
    pub reason: String,
}

impl fmt::Display for AscriptionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: malformed ascription comment '{}' ({})",
            self.key, self.line, self.reason
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
