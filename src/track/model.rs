use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::display::Column;

/// Tag and audio-property snapshot of one media item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub comment: String,
    pub genre: String,
    pub album_artist: String,
    pub composer: String,
    pub year: i32,
    pub track_number: i32,
    pub track_count: i32,
    pub disc_number: i32,
    /// Length in whole seconds.
    pub length: i32,
    /// Bitrate in kbps.
    pub bitrate: i32,
    pub sample_rate: i32,
    /// File size in bytes.
    pub size: i64,
}

impl TrackMetadata {
    /// Identity key used for membership, deletion and equality across collections.
    ///
    /// Plain concatenation of the identifying fields, not a digest: two tracks with
    /// the same tags, size and length are the same track wherever they live.
    pub fn hash_key(&self) -> String {
        format!(
            "{}{}{}{}{}{}{}{}{}{}",
            self.genre,
            self.artist,
            self.album,
            self.title,
            self.year,
            self.track_number,
            self.track_count,
            self.disc_number,
            self.size,
            self.length
        )
    }
}

/// Where a track's snapshot came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackOrigin {
    /// A file read through the tag reader; refresh re-reads it.
    File,
    /// An entry of a device database; the database already caches everything.
    Device,
}

/// One media item owned by a collection.
///
/// `path` is absolute for file-backed tracks and relative to the mount point
/// for device-backed ones. Equality is by hash key only.
#[derive(Debug, Clone)]
pub struct Track {
    pub(crate) path: PathBuf,
    pub(crate) meta: TrackMetadata,
    pub(crate) modified: Option<SystemTime>,
    pub(crate) origin: TrackOrigin,
    key: String,
}

impl Track {
    pub fn new(
        path: PathBuf,
        meta: TrackMetadata,
        modified: Option<SystemTime>,
        origin: TrackOrigin,
    ) -> Self {
        let key = meta.hash_key();
        Self {
            path,
            meta,
            modified,
            origin,
            key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meta(&self) -> &TrackMetadata {
        &self.meta
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn origin(&self) -> TrackOrigin {
        self.origin
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }

    pub fn artist(&self) -> &str {
        &self.meta.artist
    }

    pub fn album(&self) -> &str {
        &self.meta.album
    }

    pub fn length(&self) -> i32 {
        self.meta.length
    }

    pub fn size(&self) -> i64 {
        self.meta.size
    }

    /// Replace the metadata snapshot and recompute the key.
    pub(crate) fn set_meta(&mut self, meta: TrackMetadata, modified: Option<SystemTime>) {
        self.key = meta.hash_key();
        self.meta = meta;
        self.modified = modified;
    }

    /// True when the cached snapshot no longer matches what the filesystem reports.
    pub fn is_stale(&self, size: u64, modified: Option<SystemTime>) -> bool {
        self.meta.size != size as i64 || self.modified != modified
    }

    /// Value of one sortable/displayable attribute.
    pub fn column(&self, column: Column) -> ColumnValue<'_> {
        match column {
            Column::Artist => ColumnValue::Text(&self.meta.artist),
            Column::Album => ColumnValue::Text(&self.meta.album),
            Column::Title => ColumnValue::Text(&self.meta.title),
            Column::DiscNumber => ColumnValue::Number(self.meta.disc_number.into()),
            Column::TrackNumber => ColumnValue::Number(self.meta.track_number.into()),
            Column::TrackCount => ColumnValue::Number(self.meta.track_count.into()),
            Column::Length => ColumnValue::Number(self.meta.length.into()),
            Column::Year => ColumnValue::Number(self.meta.year.into()),
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Track {}

/// Type-erased column value used by the comparator and the table projection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnValue<'a> {
    Text(&'a str),
    Number(i64),
}

impl ColumnValue<'_> {
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (ColumnValue::Text(a), ColumnValue::Text(b)) => a.cmp(b),
            (ColumnValue::Number(a), ColumnValue::Number(b)) => a.cmp(b),
            // Values of one column always share a kind; numbers sort first otherwise.
            (ColumnValue::Number(_), ColumnValue::Text(_)) => Ordering::Less,
            (ColumnValue::Text(_), ColumnValue::Number(_)) => Ordering::Greater,
        }
    }
}
