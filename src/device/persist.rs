use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::track::{TagReader, read_version};

use super::{DeviceCollection, DeviceOptions};

/// Highest device-collection state version this build writes and reads.
pub const DEVICE_STATE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct DeviceHeader {
    name: String,
    mount: PathBuf,
    album_artwork: bool,
}

impl DeviceCollection {
    /// `[version][name][mount][album_artwork]`. Tracks are re-read from the device.
    pub(super) fn write_state<W: Write>(&self, writer: &mut W) -> Result<()> {
        let header = DeviceHeader {
            name: self.state.name().to_string(),
            mount: self.mount.clone(),
            album_artwork: self.options.album_artwork,
        };
        bincode::serialize_into(&mut *writer, &DEVICE_STATE_VERSION)?;
        bincode::serialize_into(&mut *writer, &header)?;
        Ok(())
    }

    /// Rebuild an unloaded collection from saved identity.
    ///
    /// `options` supplies what is not persisted; call `load_from_path` on the
    /// mount point afterwards.
    pub fn restore<R: Read>(
        reader: &mut R,
        options: DeviceOptions,
        tags: Arc<dyn TagReader>,
    ) -> Result<Self> {
        read_version(reader, DEVICE_STATE_VERSION)?;
        let header: DeviceHeader = bincode::deserialize_from(&mut *reader)?;
        let options = DeviceOptions {
            album_artwork: header.album_artwork,
            ..options
        };
        Ok(DeviceCollection::new(header.name, header.mount, options, tags))
    }
}
