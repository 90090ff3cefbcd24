use std::fs;

use tally_core::store::SlotStore;
use tally_core::task::{Task, Theme};
use tempfile::tempdir;

#[test]
fn tasks_round_trip_through_the_slot() {
    let temp = tempdir().expect("tempdir");
    let store = SlotStore::open(temp.path()).expect("open slot store");

    let tasks = vec![
        Task::new("first".to_string(), 1_000),
        Task {
            completed: true,
            ..Task::new("second".to_string(), 2_000)
        },
    ];

    store.save_tasks(&tasks).expect("save tasks");
    let loaded = store.load_tasks();

    assert_eq!(loaded, tasks);
}

#[test]
fn invalid_entries_are_dropped_silently() {
    let temp = tempdir().expect("tempdir");
    let store = SlotStore::open(temp.path()).expect("open slot store");

    fs::write(
        &store.tasks_path,
        r#"[{"id":"a","title":"x"}, {"foo":1}, "bad"]"#,
    )
    .expect("seed slot");

    let loaded = store.load_tasks();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, "a");
    assert_eq!(loaded[0].title, "x");
    assert!(!loaded[0].completed);
}

#[test]
fn corrupt_or_missing_slot_loads_empty() {
    let temp = tempdir().expect("tempdir");
    let store = SlotStore::open(temp.path()).expect("open slot store");

    assert!(store.load_tasks().is_empty());

    fs::write(&store.tasks_path, "{{{ not json").expect("seed slot");
    assert!(store.load_tasks().is_empty());

    fs::write(&store.tasks_path, r#"{"id":"a","title":"x"}"#).expect("seed slot");
    assert!(store.load_tasks().is_empty());
}

#[test]
fn stored_order_and_duplicate_ids_are_preserved() {
    let temp = tempdir().expect("tempdir");
    let store = SlotStore::open(temp.path()).expect("open slot store");

    fs::write(
        &store.tasks_path,
        r#"[{"id":"dup","title":"one"},{"id":"z","title":"two"},{"id":"dup","title":"three"}]"#,
    )
    .expect("seed slot");

    let loaded = store.load_tasks();
    let titles: Vec<&str> = loaded.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
    assert_eq!(loaded[0].id, "dup");
    assert_eq!(loaded[2].id, "dup");
}

#[test]
fn theme_slot_only_honors_the_exact_dark_value() {
    let temp = tempdir().expect("tempdir");
    let store = SlotStore::open(temp.path()).expect("open slot store");

    assert_eq!(store.load_theme(), Theme::Light);

    store.save_theme(Theme::Dark).expect("save theme");
    assert_eq!(store.load_theme(), Theme::Dark);

    for garbage in ["DARK", "darkish", "blue", "{}", "", "dark\n", " dark"] {
        fs::write(&store.theme_path, garbage).expect("seed slot");
        assert_eq!(store.load_theme(), Theme::Light, "input: {garbage:?}");
    }

    store.save_theme(Theme::Light).expect("save theme");
    assert_eq!(store.load_theme(), Theme::Light);
}

#[test]
fn save_overwrites_prior_slot_content() {
    let temp = tempdir().expect("tempdir");
    let store = SlotStore::open(temp.path()).expect("open slot store");

    let many = vec![
        Task::new("a".to_string(), 1),
        Task::new("b".to_string(), 2),
        Task::new("c".to_string(), 3),
    ];
    store.save_tasks(&many).expect("save tasks");

    let few = vec![Task::new("only".to_string(), 4)];
    store.save_tasks(&few).expect("save tasks");

    let loaded = store.load_tasks();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title, "only");
}
