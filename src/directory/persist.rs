use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LibrarySettings;
use crate::error::Result;
use crate::track::{TagReader, Track, read_version};

use super::{DirectoryCollection, DirectoryOptions};

/// Highest directory-collection state version this build writes and reads.
pub const DIRECTORY_STATE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct DirectoryHeader {
    name: String,
    root: PathBuf,
    recursive: bool,
    auto_organize: bool,
    track_count: u64,
}

impl DirectoryCollection {
    /// `[version][name][root][options][count]` followed by one record per track.
    pub(super) fn write_state<W: Write>(&self, writer: &mut W) -> Result<()> {
        let header = DirectoryHeader {
            name: self.state.name().to_string(),
            root: self.root.clone(),
            recursive: self.options.recursive,
            auto_organize: self.options.auto_organize,
            track_count: self.state.len() as u64,
        };
        bincode::serialize_into(&mut *writer, &DIRECTORY_STATE_VERSION)?;
        bincode::serialize_into(&mut *writer, &header)?;
        for track in self.state.tracks() {
            track.write_to(writer)?;
        }
        Ok(())
    }

    /// Rebuild a collection from cached state without touching the filesystem.
    ///
    /// Nothing is applied unless every record reads back.
    pub fn restore<R: Read>(
        reader: &mut R,
        scan: LibrarySettings,
        tags: Arc<dyn TagReader>,
    ) -> Result<Self> {
        read_version(reader, DIRECTORY_STATE_VERSION)?;
        let header: DirectoryHeader = bincode::deserialize_from(&mut *reader)?;

        let mut tracks = Vec::with_capacity(header.track_count.min(1 << 16) as usize);
        for _ in 0..header.track_count {
            tracks.push(Track::read_from(reader)?);
        }

        let options = DirectoryOptions {
            recursive: header.recursive,
            auto_organize: header.auto_organize,
        };
        let mut collection = DirectoryCollection::new(header.name, header.root, options, scan, tags);
        collection.state.replace_tracks(tracks);
        Ok(collection)
    }
}
