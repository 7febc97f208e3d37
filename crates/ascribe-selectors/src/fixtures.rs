//! Shared test fixtures.

use std::sync::Arc;

use ascribe_core::time::{Timestamp, parse_timestamp};
use ascribe_core::{Catalog, Message};
use ascribe_history::{
    Ascription, AscriptionCatalog, AscriptionKind, MessageSelector, Selection, SelectionInput, TokenDiffer,
};
use ascribe_settings::{AscribeSettings, UserData};

use crate::traits::SelectorEnv;

pub(crate) fn settings() -> AscribeSettings {
    let mut s = AscribeSettings::default();
    for id in ["alice", "bob", "carol"] {
        let _ = s.users.insert(
            id.into(),
            UserData {
                name: id.into(),
                ..UserData::default()
            },
        );
    }
    let _ = s.review_tags.insert("terms".into());
    s
}

pub(crate) fn at(day: u32) -> Timestamp {
    parse_timestamp(&format!("2024-03-{day:02} 12:00:00+0100")).unwrap()
}

/// History entry by `user`; `kind` is `m`, `r` or `r/<tag>`.
pub(crate) fn entry(user: &str, kind: &str, msgstr: &str, day: u32) -> Ascription {
    let (kind, tag) = kind.split_once('/').unwrap_or((kind, ""));
    let kind = if kind == "r" {
        AscriptionKind::Review
    } else {
        AscriptionKind::Modification
    };
    Ascription {
        user: Some(user.into()),
        kind,
        tag: tag.into(),
        date: Some(at(day)),
        separator_length: 0,
        fuzzy: false,
        obsolete: false,
        msg: Message::new("Open").with_translation(msgstr),
        seq: 0,
        pos: 0,
    }
}

pub(crate) struct Fixture {
    pub(crate) env: SelectorEnv,
    pub(crate) catalog: Catalog,
    pub(crate) acat: AscriptionCatalog,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let settings = Arc::new(settings());
        let acat = AscriptionCatalog::new("app", "po-ascript/app.po", &settings, &at(1));
        Self {
            env: SelectorEnv::new(settings, Arc::new(TokenDiffer)),
            catalog: Catalog::new("app", "po/app.po"),
            acat,
        }
    }

    pub(crate) fn select(&self, sel: &dyn MessageSelector, msg: &Message, history: &[Ascription]) -> Selection {
        sel.select(&SelectionInput {
            msg,
            catalog: &self.catalog,
            acat: &self.acat,
            history,
        })
    }
}
