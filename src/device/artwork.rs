//! Cover art lookup and storage.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::database::{artwork_dir, relative_to_device_path};

/// Image bytes plus the file extension they should be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub data: Vec<u8>,
    pub ext: String,
}

fn sniff_ext(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "png",
        [b'G', b'I', b'F', b'8', ..] => "gif",
        [b'B', b'M', ..] => "bmp",
        _ => "jpg",
    }
}

fn is_cover_name(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| {
            let s = s.to_ascii_lowercase();
            s == "cover" || s == "folder"
        })
        .unwrap_or(false)
}

/// First `cover.*` or `folder.*` file next to `track`, case-insensitive, by name order.
pub fn sibling_cover(track: &Path) -> Option<PathBuf> {
    let dir = track.parent()?;
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_cover_name(p))
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Embedded art if the tags carry any, else a sibling cover file.
pub fn find_artwork(embedded: Option<Vec<u8>>, track: &Path) -> Option<Artwork> {
    if let Some(data) = embedded.filter(|d| !d.is_empty()) {
        let ext = sniff_ext(&data).to_string();
        return Some(Artwork { data, ext });
    }
    let cover = sibling_cover(track)?;
    let data = fs::read(&cover).ok()?;
    let ext = cover
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| sniff_ext(&data).to_string());
    Some(Artwork { data, ext })
}

/// Write `art` as `iPod_Control/Artwork/<id>.<ext>` and return its device path.
pub fn store(mount: &Path, id: u32, art: &Artwork) -> Result<String> {
    let dir = artwork_dir(mount);
    fs::create_dir_all(&dir)?;
    let file = dir.join(format!("{id}.{}", art.ext));
    fs::write(&file, &art.data)?;
    let rel = file.strip_prefix(mount).unwrap_or(file.as_path());
    Ok(relative_to_device_path(rel))
}
