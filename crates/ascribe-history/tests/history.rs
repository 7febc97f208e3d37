#![allow(missing_docs)]

use std::sync::Arc;

use ascribe_core::time::{Timestamp, parse_timestamp};
use ascribe_core::{Message, TrackedField};
use ascribe_history::filter::DiffMode;
use ascribe_history::record::ShadowHeader;
use ascribe_history::writer::{ascribe_modification, ascribe_review};
use ascribe_history::{
    AscriptionCatalog, AscriptionKind, HistoryOptions, TextFilter, TokenDiffer, collect_history,
};
use ascribe_settings::{AscribeSettings, UserData};

fn settings() -> AscribeSettings {
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
    s
}

fn at(day: u32) -> Timestamp {
    parse_timestamp(&format!("2024-03-{day:02} 12:00:00+0100")).unwrap()
}

fn new_acat(s: &AscribeSettings) -> AscriptionCatalog {
    AscriptionCatalog::new("app", "po-ascript/app.po", s, &at(1))
}

fn history_of(msg: &Message, acat: &AscriptionCatalog, s: &AscribeSettings) -> ascribe_history::History {
    collect_history(msg, acat, s, &TokenDiffer, &HistoryOptions::default())
}

#[test]
fn alice_then_bob_encodes_back_reference_and_literal() {
    let s = settings();
    let mut acat = new_acat(&s);
    let v1 = Message::new("Open").with_translation("Otvori");
    let mut v2 = v1.clone();
    v2.manual_comment = vec!["note".into()];

    let _ = ascribe_modification(&v1, &mut acat, "alice", &at(2), &s).unwrap();
    let out = ascribe_modification(&v2, &mut acat, "bob", &at(3), &s).unwrap();
    assert!(out.fields_changed());

    let record = acat.get(&v1.key()).unwrap();
    assert_eq!(record.blobs(TrackedField::Msgstr), ["Otvori|~\n|~e0"]);
    assert_eq!(record.blobs(TrackedField::ManualComment), ["|~x\nnote|~"]);

    let history = history_of(&v2, &acat, &s);
    assert_eq!(history.len(), 2);
    assert!(history[0].is_by("bob"));
    assert_eq!(history[0].msg.manual_comment, ["note"]);
    assert!(history[1].msg.manual_comment.is_empty());
    assert_eq!(history[1].msg.msgstr, ["Otvori"]);
}

#[test]
fn every_write_round_trips() {
    let s = settings();
    let mut acat = new_acat(&s);
    let mut versions = Vec::new();

    let mut msg = Message::new("file").with_translation("datoteka");
    versions.push(msg.clone());
    msg.msgid_plural = Some("files".into());
    msg.msgstr = vec!["datoteka".into(), "datoteke".into(), "datoteka|~".into()];
    versions.push(msg.clone());
    msg.msgstr.truncate(2);
    msg.manual_comment = vec!["two".into(), "lines".into()];
    versions.push(msg.clone());
    msg.msgstr = vec!["datoteka".into(), String::new()];
    versions.push(msg.clone());

    let users = ["alice", "bob", "carol", "alice"];
    for (day, (v, user)) in versions.iter().zip(users).enumerate() {
        let _ = ascribe_modification(v, &mut acat, user, &at(day as u32 + 2), &s).unwrap();
    }

    let history = history_of(versions.last().unwrap(), &acat, &s);
    assert_eq!(history.len(), versions.len());
    for (entry, expected) in history.iter().zip(versions.iter().rev()) {
        assert!(entry.msg.ascription_eq(expected), "{:?} != {:?}", entry.msg, expected);
    }
}

#[test]
fn unchanged_rewrite_adds_no_tokens() {
    let s = settings();
    let mut acat = new_acat(&s);
    let msg = Message::new("Open").with_translation("Otvori");
    let _ = ascribe_modification(&msg, &mut acat, "alice", &at(2), &s).unwrap();
    let blobs_before = acat.get(&msg.key()).unwrap().blobs(TrackedField::Msgstr).to_vec();

    let out = ascribe_modification(&msg, &mut acat, "bob", &at(3), &s).unwrap();
    assert_eq!(out.separator_length, 0);
    let record = acat.get(&msg.key()).unwrap();
    assert_eq!(record.blobs(TrackedField::Msgstr), blobs_before);
    assert_eq!(record.lines.len(), 2);
}

#[test]
fn never_ascribed_message_is_unascribed_head() {
    let s = settings();
    let acat = new_acat(&s);
    let msg = Message::new("Open").with_translation("Otvori");
    let history = history_of(&msg, &acat, &s);
    assert_eq!(history.len(), 1);
    assert!(history[0].user.is_none());
    assert_eq!(history[0].kind, AscriptionKind::Modification);
    assert_eq!(history[0].msg, msg);
}

#[test]
fn history_survives_persistence() {
    let s = settings();
    let mut acat = new_acat(&s);
    let msg = Message::new("Open").with_translation("Otvori");
    let _ = ascribe_modification(&msg, &mut acat, "alice", &at(2), &s).unwrap();
    let _ = ascribe_review(&msg, &mut acat, &[], "bob", &at(3), &s).unwrap();

    let stored = acat.to_catalog();
    let reloaded = AscriptionCatalog::from_catalog(&stored, ShadowHeader::for_catalog("app", &s, &at(1)));
    let history = history_of(&msg, &reloaded, &s);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].kind, AscriptionKind::Review);
    assert_eq!(history[0].msg.msgstr, ["Otvori"]);
}

#[test]
fn reduce_added_through_collect() {
    let s = settings();
    let mut acat = new_acat(&s);
    let v1 = Message::new("Open the file").with_translation("Open the file.");
    let v2 = Message::new("Open the file").with_translation("Open the file. Then save it.");
    let _ = ascribe_modification(&v1, &mut acat, "alice", &at(2), &s).unwrap();
    let _ = ascribe_modification(&v2, &mut acat, "bob", &at(3), &s).unwrap();

    let options = HistoryOptions {
        reduce: Some(DiffMode::Added),
        ..HistoryOptions::default()
    };
    let history = collect_history(&v2, &acat, &s, &TokenDiffer, &options);
    assert_eq!(history[0].msg.msgstr, ["Then save it."]);
    assert_eq!(history[1].msg.msgstr, ["Open the file."]);
}

#[test]
fn filter_collapses_cosmetic_edits() {
    let s = settings();
    let mut acat = new_acat(&s);
    let v1 = Message::new("Open").with_translation("Otvori");
    let v2 = Message::new("Open").with_translation("&Otvori");
    let _ = ascribe_modification(&v1, &mut acat, "alice", &at(2), &s).unwrap();
    let _ = ascribe_modification(&v2, &mut acat, "bob", &at(3), &s).unwrap();

    let strip: TextFilter = Arc::new(|t: &str| t.replace('&', ""));
    let options = HistoryOptions {
        filter: Some(strip),
        ..HistoryOptions::default()
    };
    let history = collect_history(&v2, &acat, &s, &TokenDiffer, &options);
    assert_eq!(history.len(), 1);
    assert!(history[0].is_by("alice"));
    assert_eq!(history[0].pos, 2);
}

#[test]
fn merge_pivot_then_drop_clean_merges() {
    let s = settings();
    let mut acat = new_acat(&s);
    let old = Message::new("Open").with_translation("Otvori");
    let _ = ascribe_modification(&old, &mut acat, "alice", &at(2), &s).unwrap();

    let mut merged = Message::new("Open file").with_translation("Otvori");
    merged.set_fuzzy(true);
    merged.msgid_previous = Some("Open".into());
    let _ = ascribe_modification(&merged, &mut acat, "fuzzy", &at(3), &s).unwrap();

    let full = history_of(&merged, &acat, &s);
    let users: Vec<_> = full.iter().map(|a| a.user.as_deref()).collect();
    assert_eq!(users, [Some("fuzzy"), Some("alice")]);

    let options = HistoryOptions {
        drop_merges: true,
        ..HistoryOptions::default()
    };
    let cleaned = collect_history(&merged, &acat, &s, &TokenDiffer, &options);
    let users: Vec<_> = cleaned.iter().map(|a| a.user.as_deref()).collect();
    assert_eq!(users, [Some("alice")]);
}
