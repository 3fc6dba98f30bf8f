use super::*;
use crate::collection::CollectionExt;
use crate::display::DisplayDescriptor;
use crate::job::JobOutcome;
use crate::testing::{FakeTags, RecordingSink, write_file};
use std::collections::HashSet;
use std::io::Cursor;
use tempfile::tempdir;

fn tags() -> Arc<FakeTags> {
    let tags = FakeTags::new();
    tags.add("x", "Xavier", "Xa", "X", 1);
    tags.add("y", "Yolanda", "Ya", "Y", 2);
    tags.add("z", "Zed", "Za", "Z", 3);
    tags.add("www", "Björk", "Homogenic", "Jóga", 4);
    Arc::new(tags)
}

fn collection(name: &str, root: &Path, tags: &Arc<FakeTags>) -> DirectoryCollection {
    DirectoryCollection::new(
        name,
        root,
        DirectoryOptions::default(),
        LibrarySettings::default(),
        tags.clone(),
    )
}

fn loaded(name: &str, root: &Path, tags: &Arc<FakeTags>) -> DirectoryCollection {
    let mut c = collection(name, root, tags);
    c.load_from_path(root, false).unwrap();
    c
}

fn titles(c: &DirectoryCollection) -> HashSet<String> {
    c.state().tracks().map(|t| t.title().to_string()).collect()
}

fn key_set(c: &DirectoryCollection) -> HashSet<String> {
    c.state().keys().map(str::to_string).collect()
}

#[test]
fn load_skips_files_without_tags() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "a/x.mp3", "x");
    write_file(dir.path(), "a/junk.mp3", "not audio");
    write_file(dir.path(), "notes.txt", "y");

    let c = loaded("lib", dir.path(), &tags);
    assert_eq!(titles(&c), HashSet::from(["X".to_string()]));
    assert!(!c.state().is_modified());
    assert!(c.state().is_enabled());
}

#[test]
fn load_of_missing_path_fails_and_keeps_previous_tracks() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "x.mp3", "x");
    let mut c = loaded("lib", dir.path(), &tags);

    let err = c.load_from_path(&dir.path().join("missing"), false).unwrap_err();
    assert!(matches!(err, CollectionError::SourceUnavailable { .. }));
    assert_eq!(c.state().len(), 1);
    assert_eq!(c.mount_point(), dir.path());
}

#[test]
fn load_drops_duplicate_keys() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "one/x.mp3", "x");
    write_file(dir.path(), "two/x.mp3", "x");

    let c = loaded("lib", dir.path(), &tags);
    assert_eq!(c.state().len(), 1);
}

#[test]
fn interrupted_load_leaves_previous_state() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "x.mp3", "x");
    let mut c = loaded("lib", dir.path(), &tags);
    let before = key_set(&c);

    /// Cancels the token the moment the job announces itself.
    struct CancelOnStart(crate::job::CancellationToken);
    impl crate::job::EventSink for CancelOnStart {
        fn emit(&self, event: crate::job::CollectionEvent) {
            if let crate::job::CollectionEvent::ProgressBounds { .. } = event {
                self.0.cancel();
            }
        }
    }
    let token = c.state().interrupt_handle();
    c.state_mut().set_events(Arc::new(CancelOnStart(token)));

    let other = tempdir().unwrap();
    write_file(other.path(), "y.mp3", "y");
    let err = c.load_from_path(other.path(), false).unwrap_err();
    assert!(matches!(err, CollectionError::Interrupted));
    assert_eq!(key_set(&c), before);
    assert_eq!(c.mount_point(), dir.path());
    assert!(c.state().is_enabled());
}

#[test]
fn refresh_picks_up_added_changed_and_removed_files() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "x.mp3", "x");
    let y_path = write_file(dir.path(), "y.mp3", "y");
    let mut c = loaded("lib", dir.path(), &tags);
    let x_key = c.state().tracks().find(|t| t.title() == "X").unwrap().key().to_string();

    std::fs::remove_file(&y_path).unwrap();
    write_file(dir.path(), "z.mp3", "z");
    // Same path, new contents: must be re-read.
    write_file(dir.path(), "x.mp3", "www");

    c.refresh().unwrap();
    assert_eq!(titles(&c), HashSet::from(["Jóga".to_string(), "Z".to_string()]));
    assert!(!c.state().contains(&x_key));
}

#[test]
fn refresh_keeps_unchanged_snapshots_and_keys() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "x.mp3", "x");
    let mut c = loaded("lib", dir.path(), &tags);
    let before = key_set(&c);

    c.refresh().unwrap();
    assert_eq!(key_set(&c), before);
}

#[test]
fn refresh_fails_when_root_vanishes() {
    let dir = tempdir().unwrap();
    let tags = tags();
    let root = dir.path().join("lib");
    write_file(&root, "x.mp3", "x");
    let mut c = loaded("lib", &root, &tags);

    std::fs::remove_dir_all(&root).unwrap();
    assert!(c.refresh().is_err());
    assert_eq!(c.state().len(), 1);
}

#[test]
fn paths_are_projected_against_the_root() {
    let dir = tempdir().unwrap();
    let tags = tags();
    let file = write_file(dir.path(), "a/b/x.mp3", "x");
    let c = loaded("lib", dir.path(), &tags);
    let key = c.state().keys().next().unwrap().to_string();

    assert_eq!(c.relative_path(&key), Some(PathBuf::from("a/b/x.mp3")));
    assert_eq!(c.absolute_path(&key), Some(file));
    assert_eq!(c.relative_path("missing"), None);
}

#[test]
fn sync_between_folders_converges_and_keeps_layout() {
    let src_dir = tempdir().unwrap();
    let dst_dir = tempdir().unwrap();
    let tags = tags();
    write_file(src_dir.path(), "Xavier/x.mp3", "x");
    write_file(src_dir.path(), "Yolanda/y.mp3", "y");
    write_file(dst_dir.path(), "y.mp3", "y");
    let z_path = write_file(dst_dir.path(), "Zed/Za/z.mp3", "z");

    let mut src = loaded("src", src_dir.path(), &tags);
    let mut dst = loaded("dst", dst_dir.path(), &tags);

    let outcome = dst.sync_from(&mut src);
    assert_eq!(outcome, JobOutcome::Completed);
    assert_eq!(key_set(&dst), key_set(&src));
    assert!(dst_dir.path().join("Xavier/x.mp3").exists());
    // The common track stayed where it was.
    assert!(dst_dir.path().join("y.mp3").exists());
    assert!(!z_path.exists());
    assert!(!dst_dir.path().join("Zed").exists());
    assert!(src_dir.path().join("Xavier/x.mp3").exists());
}

#[test]
fn auto_organize_builds_tag_paths() {
    let src_dir = tempdir().unwrap();
    let dst_dir = tempdir().unwrap();
    let tags = tags();
    write_file(src_dir.path(), "whatever.mp3", "www");
    let src = loaded("src", src_dir.path(), &tags);
    let mut dst = loaded("dst", dst_dir.path(), &tags);
    dst.set_options(DirectoryOptions {
        recursive: true,
        auto_organize: true,
    });

    let keys: Vec<String> = src.state().keys().map(str::to_string).collect();
    assert!(dst.copy_tracks(&src, &keys).is_success());
    assert!(dst_dir.path().join("Bjork/Homogenic/04 Joga.mp3").exists());
}

#[test]
fn copying_onto_an_existing_name_gets_a_suffix() {
    let src_dir = tempdir().unwrap();
    let dst_dir = tempdir().unwrap();
    let tags = tags();
    write_file(src_dir.path(), "song.mp3", "x");
    write_file(dst_dir.path(), "song.mp3", "y");
    let src = loaded("src", src_dir.path(), &tags);
    let mut dst = loaded("dst", dst_dir.path(), &tags);

    let keys: Vec<String> = src.state().keys().map(str::to_string).collect();
    assert!(dst.copy_tracks(&src, &keys).is_success());
    assert!(dst_dir.path().join("song_1.mp3").exists());
    assert_eq!(dst.state().len(), 2);
}

#[test]
fn deleting_a_missing_file_is_reported_once() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "x.mp3", "x");
    let y = write_file(dir.path(), "y.mp3", "y");
    write_file(dir.path(), "z.mp3", "z");
    let mut c = loaded("lib", dir.path(), &tags);
    let keys: Vec<String> = c.state().keys().map(str::to_string).collect();

    std::fs::remove_file(&y).unwrap();
    let sink = Arc::new(RecordingSink::default());
    c.state_mut().set_events(sink.clone());
    let outcome = c.delete_tracks(&keys);

    assert_eq!(outcome.report().lines().count(), 1);
    assert!(outcome.report().contains("'Y' by Yolanda"));
    assert_eq!(titles(&c), HashSet::from(["Y".to_string()]));
    assert_eq!(sink.finished_reports().len(), 1);
}

#[test]
fn saved_state_restores_without_rescanning() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "x.mp3", "x");
    write_file(dir.path(), "y.mp3", "y");
    let mut c = loaded("lib", dir.path(), &tags);
    c.set_options(DirectoryOptions {
        recursive: false,
        auto_organize: true,
    });

    let mut buf = Vec::new();
    c.save_state(&mut buf).unwrap();
    std::fs::remove_dir_all(dir.path()).unwrap();

    let restored =
        DirectoryCollection::restore(&mut Cursor::new(buf), LibrarySettings::default(), tags.clone())
            .unwrap();
    assert_eq!(restored.state().name(), "lib");
    assert_eq!(restored.mount_point(), dir.path());
    assert_eq!(restored.options(), c.options());
    assert_eq!(key_set(&restored), key_set(&c));
}

#[test]
fn restore_rejects_newer_versions() {
    let mut buf = Vec::new();
    bincode::serialize_into(&mut buf, &(DIRECTORY_STATE_VERSION + 1)).unwrap();
    let tags = tags();
    let err = DirectoryCollection::restore(&mut Cursor::new(buf), LibrarySettings::default(), tags)
        .err()
        .unwrap();
    assert!(matches!(err, CollectionError::UnsupportedVersion { .. }));
}

#[test]
fn load_sorts_by_the_display_descriptor() {
    let dir = tempdir().unwrap();
    let tags = tags();
    write_file(dir.path(), "1.mp3", "z");
    write_file(dir.path(), "2.mp3", "x");
    write_file(dir.path(), "3.mp3", "y");
    let mut c = collection("lib", dir.path(), &tags);
    c.state_mut().set_display(Some(Arc::new(DisplayDescriptor::default())));
    c.load_from_path(dir.path(), false).unwrap();

    let artists: Vec<&str> = c.state().tracks().map(|t| t.artist()).collect();
    assert_eq!(artists, vec!["Xavier", "Yolanda", "Zed"]);
}
