//! Shared fixtures for unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{CollectionError, Result};
use crate::job::{CollectionEvent, EventSink};
use crate::track::{TagInfo, TagReader, Track, TrackMetadata, TrackOrigin};

/// Tag reader that looks tags up by file contents, so copies keep their tags.
#[derive(Default)]
pub struct FakeTags {
    by_content: Mutex<HashMap<String, TagInfo>>,
}

impl FakeTags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register tags for files whose contents equal `content`.
    pub fn add(&self, content: &str, artist: &str, album: &str, title: &str, track: i32) {
        let info = TagInfo {
            is_valid: true,
            has_audio_properties: true,
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            genre: "Rock".into(),
            year: 1999,
            track_number: track,
            track_count: 10,
            disc_number: 1,
            length: 180 + track,
            bitrate: 320,
            sample_rate: 44100,
            ..TagInfo::default()
        };
        self.by_content.lock().unwrap().insert(content.into(), info);
    }

    pub fn add_with_art(&self, content: &str, title: &str, art: &[u8]) {
        self.add(content, "Artist", "Album", title, 1);
        if let Some(info) = self.by_content.lock().unwrap().get_mut(content) {
            info.cover_art = Some(art.to_vec());
        }
    }
}

impl TagReader for FakeTags {
    fn read(&self, path: &Path) -> Result<TagInfo> {
        let content = fs::read_to_string(path)?;
        let mut info = self
            .by_content
            .lock()
            .unwrap()
            .get(content.trim())
            .cloned()
            .ok_or_else(|| CollectionError::Tags {
                path: path.to_path_buf(),
                message: "not audio".into(),
            })?;
        info.file_size = fs::metadata(path)?.len() as i64;
        Ok(info)
    }
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn meta(artist: &str, album: &str, title: &str, track: i32) -> TrackMetadata {
    TrackMetadata {
        title: title.into(),
        artist: artist.into(),
        album: album.into(),
        genre: "Rock".into(),
        year: 1999,
        track_number: track,
        track_count: 10,
        disc_number: 1,
        length: 180 + track,
        bitrate: 320,
        sample_rate: 44100,
        size: 1000 + track as i64,
        ..TrackMetadata::default()
    }
}

pub fn file_track(artist: &str, album: &str, title: &str, track: i32) -> Track {
    Track::new(
        PathBuf::from(format!("/music/{artist}/{album}/{title}.mp3")),
        meta(artist, album, title, track),
        None,
        TrackOrigin::File,
    )
}

/// Event sink that keeps everything it receives.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<CollectionEvent>>,
}

impl RecordingSink {
    pub fn finished_reports(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                CollectionEvent::JobFinished { report, .. } => Some(report.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: CollectionEvent) {
        self.events.lock().unwrap().push(event);
    }
}
