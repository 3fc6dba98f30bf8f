use std::fs;
use std::path::Path;

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::tag::{Accessor, ItemKey};
use tracing::debug;

use crate::error::{CollectionError, Result};

use super::model::{Track, TrackMetadata, TrackOrigin};

/// Everything the tag reader knows about one file.
#[derive(Debug, Clone, Default)]
pub struct TagInfo {
    pub is_valid: bool,
    pub has_audio_properties: bool,
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
    pub length: i32,
    pub bitrate: i32,
    pub sample_rate: i32,
    pub file_size: i64,
    pub cover_art: Option<Vec<u8>>,
}

impl TagInfo {
    pub fn metadata(&self) -> TrackMetadata {
        TrackMetadata {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            comment: self.comment.clone(),
            genre: self.genre.clone(),
            album_artist: self.album_artist.clone(),
            composer: self.composer.clone(),
            year: self.year,
            track_number: self.track_number,
            track_count: self.track_count,
            disc_number: self.disc_number,
            length: self.length,
            bitrate: self.bitrate,
            sample_rate: self.sample_rate,
            size: self.file_size,
        }
    }
}

/// Reads tags and audio properties from a media file.
pub trait TagReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<TagInfo>;
}

/// `TagReader` backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

fn non_empty(v: Option<impl AsRef<str>>) -> String {
    v.map(|s| s.as_ref().trim().to_string()).unwrap_or_default()
}

fn leading_year(date: &str) -> i32 {
    let digits: String = date.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<TagInfo> {
        let file_size = fs::metadata(path)?.len() as i64;
        let tagged = lofty::read_from_path(path).map_err(|e| CollectionError::Tags {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let props = tagged.properties();
        let mut info = TagInfo {
            is_valid: true,
            has_audio_properties: !props.duration().is_zero(),
            length: props.duration().as_secs() as i32,
            bitrate: props.audio_bitrate().unwrap_or(0) as i32,
            sample_rate: props.sample_rate().unwrap_or(0) as i32,
            file_size,
            ..TagInfo::default()
        };

        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            info.title = non_empty(tag.title());
            info.artist = non_empty(tag.artist());
            info.album = non_empty(tag.album());
            info.comment = non_empty(tag.comment());
            info.genre = non_empty(tag.genre());
            info.album_artist = non_empty(tag.get_string(&ItemKey::AlbumArtist));
            info.composer = non_empty(tag.get_string(&ItemKey::Composer));
            info.year = tag
                .get_string(&ItemKey::RecordingDate)
                .map(leading_year)
                .unwrap_or(0);
            info.track_number = tag.track().unwrap_or(0) as i32;
            info.track_count = tag.track_total().unwrap_or(0) as i32;
            info.disc_number = tag.disk().unwrap_or(0) as i32;

            let pictures = tag.pictures();
            info.cover_art = pictures
                .iter()
                .find(|p| p.pic_type() == PictureType::CoverFront)
                .or_else(|| pictures.first())
                .map(|p| p.data().to_vec());
        }

        if info.title.is_empty() {
            info.title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("UNKNOWN")
                .to_string();
        }

        debug!("Read tags from {}", path.display());
        Ok(info)
    }
}

impl Track {
    /// Build a file-backed track, rejecting files without audio properties.
    pub fn from_file(path: &Path, reader: &dyn TagReader) -> Result<Self> {
        let (meta, modified) = read_snapshot(path, reader)?;
        Ok(Track::new(path.to_path_buf(), meta, modified, TrackOrigin::File))
    }

    /// Re-read the underlying source.
    ///
    /// Device-backed tracks are a no-op. On error the caller must drop the track.
    pub fn refresh(&mut self, reader: &dyn TagReader) -> Result<()> {
        if self.origin == TrackOrigin::Device {
            return Ok(());
        }
        let (meta, modified) = read_snapshot(&self.path, reader)?;
        self.set_meta(meta, modified);
        Ok(())
    }
}

fn read_snapshot(
    path: &Path,
    reader: &dyn TagReader,
) -> Result<(TrackMetadata, Option<std::time::SystemTime>)> {
    let stat = fs::metadata(path).map_err(|_| CollectionError::SourceUnavailable {
        path: path.to_path_buf(),
    })?;
    let info = reader.read(path)?;
    if !info.is_valid || !info.has_audio_properties {
        return Err(CollectionError::Tags {
            path: path.to_path_buf(),
            message: "no audio properties".to_string(),
        });
    }
    let mut meta = info.metadata();
    meta.size = stat.len() as i64;
    Ok((meta, stat.modified().ok()))
}
