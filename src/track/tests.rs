use super::*;
use crate::display::Column;
use crate::testing::{FakeTags, file_track, meta, write_file};
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn hash_key_concatenates_identity_fields_in_order() {
    let m = meta("Artist", "Album", "Song", 3);
    assert_eq!(m.hash_key(), "RockArtistAlbumSong199931011003183");
}

#[test]
fn equality_ignores_path() {
    let a = file_track("A", "B", "C", 1);
    let mut b = a.clone();
    b.path = PathBuf::from("/elsewhere/c.mp3");
    assert_eq!(a, b);

    let c = file_track("A", "B", "C", 2);
    assert_ne!(a, c);
}

#[test]
fn column_values_are_typed() {
    let t = file_track("Artist", "Album", "Song", 4);
    assert_eq!(t.column(Column::Artist), ColumnValue::Text("Artist"));
    assert_eq!(t.column(Column::TrackNumber), ColumnValue::Number(4));
    assert_eq!(t.column(Column::Year), ColumnValue::Number(1999));
    assert_eq!(t.column(Column::Length), ColumnValue::Number(184));
}

#[test]
fn format_length_switches_to_hours() {
    assert_eq!(format_length(0), "0:00");
    assert_eq!(format_length(65), "1:05");
    assert_eq!(format_length(3599), "59:59");
    assert_eq!(format_length(3600), "1:00:00");
    assert_eq!(format_length(3725), "1:02:05");
}

#[test]
fn cell_text_blanks_zero_numbers() {
    let mut m = meta("Artist", "Album", "Song", 0);
    m.length = 61;
    let t = Track::new(PathBuf::from("/x.mp3"), m, None, TrackOrigin::File);
    assert_eq!(cell_text(&t, Column::TrackNumber), "");
    assert_eq!(cell_text(&t, Column::Length), "1:01");
    assert_eq!(cell_text(&t, Column::Title), "Song");
}

#[test]
fn refresh_keeps_hash_when_file_unchanged() {
    let dir = tempdir().unwrap();
    let tags = FakeTags::new();
    tags.add("one", "Artist", "Album", "One", 1);
    let path = write_file(dir.path(), "one.mp3", "one");

    let mut t = Track::from_file(&path, &tags).unwrap();
    let before = t.key().to_string();
    t.refresh(&tags).unwrap();
    assert_eq!(t.key(), before);
    assert_eq!(t.size(), 3);
}

#[test]
fn refresh_fails_once_file_is_gone() {
    let dir = tempdir().unwrap();
    let tags = FakeTags::new();
    tags.add("one", "Artist", "Album", "One", 1);
    let path = write_file(dir.path(), "one.mp3", "one");

    let mut t = Track::from_file(&path, &tags).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(t.refresh(&tags).is_err());
}

#[test]
fn from_file_rejects_unparsable_files() {
    let dir = tempdir().unwrap();
    let tags = FakeTags::new();
    let path = write_file(dir.path(), "junk.mp3", "junk");
    assert!(Track::from_file(&path, &tags).is_err());
}

#[test]
fn device_tracks_refresh_as_noop_and_persist_nothing() {
    let mut t = Track::new(
        PathBuf::from("iPod_Control/Music/F00/ABCD.mp3"),
        meta("A", "B", "C", 1),
        None,
        TrackOrigin::Device,
    );
    let tags = FakeTags::new();
    t.refresh(&tags).unwrap();

    let mut buf = Vec::new();
    t.write_to(&mut buf).unwrap();
    assert!(buf.is_empty());
}

#[test]
fn persisted_record_reproduces_every_attribute() {
    let mut m = meta("Artist", "Album", "Song", 7);
    m.comment = "live".into();
    m.album_artist = "Various".into();
    m.composer = "Someone".into();
    let modified = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
    let t = Track::new(PathBuf::from("/music/song.flac"), m, Some(modified), TrackOrigin::File);

    let mut buf = Vec::new();
    t.write_to(&mut buf).unwrap();
    let back = Track::read_from(&mut Cursor::new(buf)).unwrap();

    assert_eq!(back.path(), t.path());
    assert_eq!(back.meta(), t.meta());
    assert_eq!(back.modified(), t.modified());
    assert_eq!(back.origin(), TrackOrigin::File);
    assert_eq!(back.key(), t.key());
}

#[test]
fn record_layout_keeps_classic_fields_first() {
    let mut m = meta("Artist", "Album", "Song", 7);
    m.comment = "live".into();
    m.album_artist = "Various".into();
    m.composer = "Someone".into();
    let t = Track::new(PathBuf::from("/music/song.flac"), m, None, TrackOrigin::File);

    let mut buf = Vec::new();
    t.write_to(&mut buf).unwrap();
    let mut cursor = Cursor::new(buf);

    type Classic = (
        u32,
        PathBuf,
        (String, String, String, String, String),
        (i32, i32, i32, i32, i32, i32, i32),
        i64,
        Option<std::time::SystemTime>,
    );
    let (version, path, text, numbers, size, modified): Classic =
        bincode::deserialize_from(&mut cursor).unwrap();
    assert_eq!(version, TRACK_RECORD_VERSION);
    assert_eq!(path, PathBuf::from("/music/song.flac"));
    assert_eq!(
        text,
        (
            "Song".to_string(),
            "Artist".to_string(),
            "Album".to_string(),
            "live".to_string(),
            "Rock".to_string()
        )
    );
    assert_eq!(numbers, (1999, 7, 10, 1, 187, 320, 44100));
    assert_eq!(size, 1007);
    assert_eq!(modified, None);

    let extra: (String, String) = bincode::deserialize_from(&mut cursor).unwrap();
    assert_eq!(extra, ("Various".to_string(), "Someone".to_string()));
}

#[test]
fn newer_record_versions_are_rejected() {
    let mut buf = Vec::new();
    bincode::serialize_into(&mut buf, &(TRACK_RECORD_VERSION + 1)).unwrap();
    buf.extend_from_slice(&[0u8; 64]);
    let err = Track::read_from(&mut Cursor::new(buf)).unwrap_err();
    assert!(matches!(
        err,
        crate::error::CollectionError::UnsupportedVersion { .. }
    ));
}
