use crate::track::TrackMetadata;

use super::database::SortFields;

/// Lowercase `value` and drop the first matching leading prefix.
///
/// A value that is nothing but the prefix is kept as is.
pub fn sort_key(value: &str, prefixes: &[String]) -> String {
    let folded = value.trim().to_lowercase();
    for prefix in prefixes {
        let prefix = prefix.to_lowercase();
        if prefix.trim().is_empty() {
            continue;
        }
        if let Some(rest) = folded.strip_prefix(prefix.as_str()) {
            let rest = rest.trim_start();
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    folded
}

pub fn sort_fields(meta: &TrackMetadata, prefixes: &[String]) -> SortFields {
    SortFields {
        title: sort_key(&meta.title, prefixes),
        artist: sort_key(&meta.artist, prefixes),
        album: sort_key(&meta.album, prefixes),
        album_artist: sort_key(&meta.album_artist, prefixes),
        composer: sort_key(&meta.composer, prefixes),
    }
}
