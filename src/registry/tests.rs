use super::*;
use crate::device::DeviceDatabase;
use crate::display::{Column, SortOrder};
use crate::testing::{FakeTags, RecordingSink, write_file};
use std::collections::HashSet;
use tempfile::tempdir;

fn tags() -> Arc<FakeTags> {
    let tags = FakeTags::new();
    tags.add("x", "Xavier", "Xa", "X", 1);
    tags.add("y", "Yolanda", "Ya", "Y", 2);
    tags.add("z", "Zed", "Za", "Z", 3);
    Arc::new(tags)
}

fn registry() -> Registry {
    Registry::new(Settings::default(), tags())
}

fn keys(registry: &Registry, name: &str) -> HashSet<String> {
    registry
        .get(name)
        .unwrap()
        .state()
        .keys()
        .map(str::to_string)
        .collect()
}

#[test]
fn detect_kind_tells_folders_from_devices() {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("music");
    std::fs::create_dir_all(&folder).unwrap();
    let ipod = dir.path().join("ipod");
    DeviceDatabase::create(&ipod).unwrap();
    let file = write_file(dir.path(), "x.mp3", "x");

    assert_eq!(detect_kind(&folder), Some(CollectionKind::Directory));
    assert_eq!(detect_kind(&ipod), Some(CollectionKind::Device));
    assert_eq!(detect_kind(&file), None);
    assert_eq!(detect_kind(&dir.path().join("missing")), None);
}

#[test]
fn open_instantiates_the_detected_backend() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("music"), "x.mp3", "x");
    DeviceDatabase::create(&dir.path().join("ipod")).unwrap();

    let mut r = registry();
    let music = r.open("music", &dir.path().join("music")).unwrap();
    assert_eq!(music.kind(), CollectionKind::Directory);
    assert_eq!(music.state().len(), 1);
    assert!(music.state().display().is_some());

    let ipod = r.open("ipod", &dir.path().join("ipod")).unwrap();
    assert_eq!(ipod.kind(), CollectionKind::Device);
    assert_eq!(r.names().collect::<Vec<_>>(), vec!["music", "ipod"]);
}

#[test]
fn names_must_be_unique() {
    let dir = tempdir().unwrap();
    let mut r = registry();
    r.open("music", dir.path()).unwrap();

    let err = r.open("music", dir.path()).err().unwrap();
    assert!(matches!(err, CollectionError::DuplicateName { .. }));
    assert_eq!(r.len(), 1);
}

#[test]
fn failed_open_registers_nothing() {
    let dir = tempdir().unwrap();
    let mut r = registry();

    let err = r.open("gone", &dir.path().join("missing")).err().unwrap();
    assert!(matches!(err, CollectionError::UnrecognizedPath { .. }));

    let broken = dir.path().join("ipod");
    DeviceDatabase::create(&broken).unwrap();
    std::fs::write(crate::device::database_path(&broken), "[]").unwrap();
    assert!(r.open("ipod", &broken).is_err());
    assert!(r.is_empty());
}

#[test]
fn sync_runs_across_members() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    write_file(&a, "x.mp3", "x");
    write_file(&a, "y.mp3", "y");
    write_file(&b, "y.mp3", "y");
    write_file(&b, "z.mp3", "z");

    let mut r = registry();
    r.open("a", &a).unwrap();
    r.open("b", &b).unwrap();

    let plan = r.plan("a", "b").unwrap();
    assert_eq!(plan.to_delete.len(), 1);
    assert_eq!(plan.to_copy.len(), 1);

    let outcome = r.sync("a", "b").unwrap();
    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(keys(&r, "b"), keys(&r, "a"));

    // Either index order works.
    write_file(&b, "z.mp3", "z");
    r.refresh("b").unwrap();
    assert_eq!(r.sync("b", "a").unwrap(), JobOutcome::Completed);
    assert_eq!(keys(&r, "a"), keys(&r, "b"));
    assert_eq!(keys(&r, "a").len(), 3);
}

#[test]
fn unknown_names_and_self_sync() {
    let dir = tempdir().unwrap();
    let mut r = registry();
    r.open("a", dir.path()).unwrap();

    assert!(matches!(
        r.sync("a", "nope"),
        Err(CollectionError::UnknownCollection { .. })
    ));
    assert_eq!(r.sync("a", "a").unwrap(), JobOutcome::Completed);
    assert!(matches!(
        r.close("nope"),
        Err(CollectionError::UnknownCollection { .. })
    ));
}

#[test]
fn copy_and_delete_by_name() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    write_file(&a, "x.mp3", "x");
    std::fs::create_dir_all(&b).unwrap();

    let mut r = registry();
    r.open("a", &a).unwrap();
    r.open("b", &b).unwrap();
    let all: Vec<String> = keys(&r, "a").into_iter().collect();

    assert!(r.copy("a", "b", &all).unwrap().is_success());
    assert_eq!(keys(&r, "b"), keys(&r, "a"));
    assert!(r.delete("b", &all).unwrap().is_success());
    assert!(keys(&r, "b").is_empty());
}

#[test]
fn set_display_resorts_every_collection() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    for root in [&a, &b] {
        write_file(root, "x.mp3", "x");
        write_file(root, "z.mp3", "z");
        write_file(root, "y.mp3", "y");
    }
    let mut r = registry();
    r.open("a", &a).unwrap();
    r.open("b", &b).unwrap();

    r.set_display(DisplayDescriptor {
        sort_order: SortOrder::Descending,
        sort_columns: vec![Column::Title],
        display_columns: vec![Column::Title],
    });

    for name in ["a", "b"] {
        let c = r.get(name).unwrap();
        let titles: Vec<&str> = c.state().tracks().map(|t| t.title()).collect();
        assert_eq!(titles, vec!["Z", "Y", "X"]);
        assert!(Arc::ptr_eq(c.state().display().unwrap(), &r.display()));
    }
}

#[test]
fn events_reach_the_registry_sink() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "x.mp3", "x");
    let sink = Arc::new(RecordingSink::default());

    let mut r = registry();
    r.set_events(sink.clone());
    r.open("a", dir.path()).unwrap();

    let events = sink.events.lock().unwrap();
    assert!(events.iter().all(|e| e.collection() == "a"));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, crate::job::CollectionEvent::JobStarted { .. }))
    );
}

#[test]
fn session_round_trip_restores_folders_and_devices() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    let scratch = dir.path().join("scratch");
    let ipod = dir.path().join("ipod");
    write_file(&music, "x.mp3", "x");
    write_file(&music, "y.mp3", "y");
    std::fs::create_dir_all(&scratch).unwrap();
    DeviceDatabase::create(&ipod).unwrap();
    let session = dir.path().join("session.bin");

    {
        let mut r = registry();
        r.open("music", &music).unwrap();
        r.open("ipod", &ipod).unwrap();
        r.open("scratch", &scratch)
            .unwrap()
            .state_mut()
            .set_save_on_exit(false);
        r.sync("music", "ipod").unwrap();
        r.save_session(&session).unwrap();
    }

    // Cached folder tracks survive even though the files are gone.
    std::fs::remove_file(music.join("x.mp3")).unwrap();

    let mut r = registry();
    let names = r.restore_session(&session).unwrap();
    assert_eq!(names, vec!["music".to_string(), "ipod".to_string()]);
    assert_eq!(keys(&r, "music").len(), 2);
    assert_eq!(keys(&r, "ipod"), keys(&r, "music"));
    assert!(!r.contains("scratch"));
}

#[test]
fn restore_skips_missing_devices_and_open_names() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    let ipod = dir.path().join("ipod");
    write_file(&music, "x.mp3", "x");
    DeviceDatabase::create(&ipod).unwrap();
    let session = dir.path().join("session.bin");

    {
        let mut r = registry();
        r.open("music", &music).unwrap();
        r.open("ipod", &ipod).unwrap();
        r.save_session(&session).unwrap();
    }
    std::fs::remove_dir_all(&ipod).unwrap();

    let mut r = registry();
    r.open("music", &music).unwrap();
    let names = r.restore_session(&session).unwrap();
    assert!(names.is_empty());
    assert_eq!(r.len(), 1);
}

#[test]
fn unreadable_session_registers_nothing() {
    let dir = tempdir().unwrap();
    let session = dir.path().join("session.bin");
    let mut bytes = Vec::new();
    bincode::serialize_into(&mut bytes, &(SESSION_VERSION + 1)).unwrap();
    std::fs::write(&session, bytes).unwrap();

    let mut r = registry();
    assert!(matches!(
        r.restore_session(&session),
        Err(CollectionError::UnsupportedVersion { .. })
    ));
    assert!(r.is_empty());
}

#[test]
fn unknown_collection_tag_is_malformed() {
    let dir = tempdir().unwrap();
    let session = dir.path().join("session.bin");
    let mut bytes = Vec::new();
    bincode::serialize_into(&mut bytes, &SESSION_VERSION).unwrap();
    bincode::serialize_into(&mut bytes, &1u64).unwrap();
    bincode::serialize_into(&mut bytes, &7u8).unwrap();
    std::fs::write(&session, bytes).unwrap();

    let mut r = registry();
    let err = r.restore_session(&session).unwrap_err();
    assert!(matches!(err, CollectionError::Malformed { .. }));
    assert!(err.to_string().contains("tag 7"));
    assert!(r.is_empty());
}

#[test]
fn close_flushes_and_forgets() {
    let dir = tempdir().unwrap();
    let music = dir.path().join("music");
    let ipod = dir.path().join("ipod");
    write_file(&music, "x.mp3", "x");
    DeviceDatabase::create(&ipod).unwrap();

    let mut r = registry();
    r.open("music", &music).unwrap();
    let source = r.get("music").unwrap();
    let key = source.state().keys().next().unwrap().to_string();
    let mut device = crate::device::DeviceCollection::new(
        "loose",
        &ipod,
        crate::device::DeviceOptions::default(),
        tags(),
    );
    device.load_from_path(&ipod, false).unwrap();
    device.quiet_copy_track(source, &key).unwrap();
    drop(device);

    r.open("ipod", &ipod).unwrap();
    assert_eq!(keys(&r, "ipod").len(), 1);
    r.close("ipod").unwrap();
    assert!(!r.contains("ipod"));
}
