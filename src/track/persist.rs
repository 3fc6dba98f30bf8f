use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{CollectionError, Result};

use super::model::{Track, TrackMetadata, TrackOrigin};

/// Highest record version this build writes and reads.
pub const TRACK_RECORD_VERSION: u32 = 1;

// Field order is the on-disk order: the classic record first, then the
// fields added on top of it.
#[derive(Serialize, Deserialize)]
struct TrackRecord {
    path: PathBuf,
    title: String,
    artist: String,
    album: String,
    comment: String,
    genre: String,
    year: i32,
    track_number: i32,
    track_count: i32,
    disc_number: i32,
    length: i32,
    bitrate: i32,
    sample_rate: i32,
    size: i64,
    modified: Option<SystemTime>,
    album_artist: String,
    composer: String,
}

/// Read a version tag and reject anything newer than `supported`.
pub(crate) fn read_version<R: Read>(reader: &mut R, supported: u32) -> Result<u32> {
    let found: u32 = bincode::deserialize_from(reader)?;
    if found > supported {
        return Err(CollectionError::UnsupportedVersion { found, supported });
    }
    Ok(found)
}

impl Track {
    /// Persist the snapshot. Device-backed tracks write nothing.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.origin == TrackOrigin::Device {
            return Ok(());
        }
        let m = &self.meta;
        let record = TrackRecord {
            path: self.path.clone(),
            title: m.title.clone(),
            artist: m.artist.clone(),
            album: m.album.clone(),
            comment: m.comment.clone(),
            genre: m.genre.clone(),
            album_artist: m.album_artist.clone(),
            composer: m.composer.clone(),
            year: m.year,
            track_number: m.track_number,
            track_count: m.track_count,
            disc_number: m.disc_number,
            length: m.length,
            bitrate: m.bitrate,
            sample_rate: m.sample_rate,
            size: m.size,
            modified: self.modified,
        };
        bincode::serialize_into(&mut *writer, &TRACK_RECORD_VERSION)?;
        bincode::serialize_into(&mut *writer, &record)?;
        Ok(())
    }

    /// Read one file-backed record written by [`Track::write_to`].
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        read_version(reader, TRACK_RECORD_VERSION)?;
        let r: TrackRecord = bincode::deserialize_from(reader)?;
        let meta = TrackMetadata {
            title: r.title,
            artist: r.artist,
            album: r.album,
            comment: r.comment,
            genre: r.genre,
            album_artist: r.album_artist,
            composer: r.composer,
            year: r.year,
            track_number: r.track_number,
            track_count: r.track_count,
            disc_number: r.disc_number,
            length: r.length,
            bitrate: r.bitrate,
            sample_rate: r.sample_rate,
            size: r.size,
        };
        Ok(Track::new(r.path, meta, r.modified, TrackOrigin::File))
    }
}
