mod support;

use std::fs;
use std::rc::Rc;

use navigator_core::{Column, JobId};
use navigator_engine::{
    FileStore, KeyValueStore, LayoutState, MemoryStore, PersistentStore, ShortlistState,
    StorageKeys,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use support::init_logging;

fn job(raw: &str) -> JobId {
    JobId::parse(raw).expect("numeric id")
}

fn store_with(entries: &[(&str, &str)]) -> (Rc<PersistentStore<MemoryStore>>, MemoryStore) {
    init_logging();
    let backend = MemoryStore::with_entries(entries.iter().copied());
    let store = Rc::new(PersistentStore::new(backend.clone(), StorageKeys::default()));
    (store, backend)
}

#[test]
fn legacy_shortlist_entries_are_cleaned_and_written_back() {
    let (store, backend) = store_with(&[(
        "ww-navigator-shortlist",
        r#"["job_43566","abc","123456","43566"]"#,
    )]);

    let shortlist = ShortlistState::load(store);
    assert_eq!(shortlist.set().to_vec(), vec![job("43566"), job("123456")]);
    assert_eq!(
        backend.raw("ww-navigator-shortlist").as_deref(),
        Some(r#"["43566","123456"]"#)
    );
}

#[test]
fn clean_shortlist_is_not_rewritten() {
    let (store, backend) = store_with(&[("ww-navigator-shortlist", r#"["43566","123456"]"#)]);
    backend.set_read_only(true);

    // A write attempt would fail and be logged; the set still loads.
    let shortlist = ShortlistState::load(store);
    assert_eq!(shortlist.set().len(), 2);
}

#[test]
fn numeric_shortlist_entries_are_rewritten_as_strings() {
    let (store, backend) = store_with(&[("ww-navigator-shortlist", "[43566,123456]")]);

    let shortlist = ShortlistState::load(store);
    assert_eq!(shortlist.set().to_vec(), vec![job("43566"), job("123456")]);
    assert_eq!(
        backend.raw("ww-navigator-shortlist").as_deref(),
        Some(r#"["43566","123456"]"#)
    );
}

#[test]
fn failed_writes_keep_the_session_state() {
    let (store, backend) = store_with(&[("ww-navigator-shortlist", r#"["111111"]"#)]);
    let mut shortlist = ShortlistState::load(Rc::clone(&store));
    let mut layout = LayoutState::load(store);
    layout.register_fields("Info", &["Work Term", "Job Type"]);
    let stored_prefs = backend.raw("ww-navigator-prefs");
    backend.set_read_only(true);

    assert!(shortlist.toggle_local(&job("222222")));
    assert!(!shortlist.toggle_local(&job("111111")));
    assert_eq!(shortlist.set().to_vec(), vec![job("222222")]);
    assert!(layout.move_field("Info", "Job Type", Column::Right, 0));
    let columns = layout.layout().field_columns("Info").expect("registered");
    assert_eq!(columns.right, vec!["Job Type".to_string()]);
    assert!(layout.layout().is_dual_column("Info"));

    assert_eq!(
        backend.raw("ww-navigator-shortlist").as_deref(),
        Some(r#"["111111"]"#)
    );
    assert_eq!(backend.raw("ww-navigator-prefs"), stored_prefs);
}

#[test]
fn unreadable_records_fall_back_to_defaults() {
    let (store, _) = store_with(&[
        ("ww-navigator-shortlist", "{not json"),
        ("ww-navigator-prefs", "[1, 2"),
    ]);
    assert!(store.load_shortlist().is_empty());
    assert_eq!(store.load_layout(), navigator_core::Layout::new());
    assert!(store.load_ui_enabled());
}

#[test]
fn ui_flag_is_true_only_for_the_literal_true() {
    let (store, backend) = store_with(&[("ww-navigator-ui-enabled", "false")]);
    assert!(!store.load_ui_enabled());
    store.save_ui_enabled(true).expect("writable");
    assert_eq!(backend.raw("ww-navigator-ui-enabled").as_deref(), Some("true"));

    backend.set("ww-navigator-ui-enabled", "yes").expect("writable");
    assert!(!store.load_ui_enabled());
}

#[test]
fn flat_field_order_is_migrated_to_columns() {
    let (store, backend) = store_with(&[(
        "ww-navigator-prefs",
        r#"{"sectionOrder":["B","A","B"],"fieldOrder":{"A":["x","y","x"]},"collapsedSections":{"A":true,"B":false}}"#,
    )]);

    let layout = store.load_layout();
    assert_eq!(layout.section_order(), ["B".to_string(), "A".to_string()]);
    let columns = layout.field_columns("A").expect("migrated");
    assert_eq!(columns.left, vec!["x".to_string(), "y".to_string()]);
    assert!(columns.right.is_empty());
    assert!(layout.is_panel_collapsed("A"));
    assert!(!layout.is_panel_collapsed("B"));

    let written = backend.raw("ww-navigator-prefs").expect("written back");
    assert!(written.contains(r#""fieldOrder":{"A":{"columns":{"left":["x","y"],"right":[]}}}"#));
}

#[test]
fn moving_a_field_keeps_columns_exclusive_and_persists() {
    let (store, backend) = store_with(&[]);
    let mut layout = LayoutState::load(Rc::clone(&store));
    layout.register_fields("Info", &["Work Term", "Job Type", "Summary"]);

    assert!(layout.move_field("Info", "Job Type", Column::Right, 0));
    assert!(layout.move_field("Info", "Summary", Column::Right, 0));
    assert!(layout.move_field("Info", "Job Type", Column::Left, 5));

    let columns = layout.layout().field_columns("Info").expect("registered").clone();
    assert_eq!(columns.left, vec!["Work Term".to_string(), "Job Type".to_string()]);
    assert_eq!(columns.right, vec!["Summary".to_string()]);

    let reloaded = PersistentStore::new(backend, StorageKeys::default()).load_layout();
    assert_eq!(reloaded.field_columns("Info"), Some(&columns));
}

#[test]
fn shortlist_mutations_persist_in_numeric_order() {
    let (store, backend) = store_with(&[]);
    let mut shortlist = ShortlistState::load(store);

    assert!(shortlist.toggle_local(&job("900001")));
    assert!(shortlist.toggle_local(&job("45000")));
    assert_eq!(
        backend.raw("ww-navigator-shortlist").as_deref(),
        Some(r#"["45000","900001"]"#)
    );

    let changed = shortlist.bulk_set(&[job("45000"), job("100000")], true);
    assert_eq!(changed, 1);
    shortlist.clear_all();
    assert_eq!(backend.raw("ww-navigator-shortlist").as_deref(), Some("[]"));
}

#[test]
fn file_store_round_trips_through_a_directory() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("navigator");
    let backend = FileStore::new(dir.clone());

    assert_eq!(backend.get("ww-navigator-shortlist").unwrap(), None);
    let store = PersistentStore::new(backend, StorageKeys::default());
    let mut set = navigator_core::ShortlistSet::new();
    set.set(&job("123456"), true);
    store.save_shortlist(&set).unwrap();

    let on_disk = fs::read_to_string(dir.join("ww-navigator-shortlist.json")).unwrap();
    assert_eq!(on_disk, r#"["123456"]"#);
    assert_eq!(store.load_shortlist(), set);

    store.backend().remove("ww-navigator-shortlist").unwrap();
    store.backend().remove("ww-navigator-shortlist").unwrap();
    assert!(store.load_shortlist().is_empty());
}
