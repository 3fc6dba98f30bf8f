//! Path layout for copied-in tracks.

use std::fs;
use std::path::{Path, PathBuf};

use crate::track::TrackMetadata;

fn fold_char(c: char) -> Option<&'static str> {
    Some(match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'ď' | 'đ' | 'ð' => "d",
        'Ď' | 'Đ' | 'Ð' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => "E",
        'ğ' => "g",
        'Ğ' => "G",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "I",
        'ł' => "l",
        'Ł' => "L",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'ř' => "r",
        'Ř' => "R",
        'ś' | 'š' | 'ş' => "s",
        'Ś' | 'Š' | 'Ş' => "S",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'Ť' | 'Ţ' => "T",
        'þ' => "th",
        'Þ' => "TH",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ž' | 'ź' | 'ż' => "z",
        'Ž' | 'Ź' | 'Ż' => "Z",
        '‘' | '’' | '´' => "'",
        '“' | '”' => "",
        '–' | '—' => "-",
        '…' => "...",
        _ => return None,
    })
}

/// Make one path component safe on any filesystem.
///
/// Accented Latin letters fold to ASCII; anything else outside printable
/// ASCII, and the characters Windows rejects, become `_`.
pub fn sanitize_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => out.push('_'),
            c if c.is_ascii_control() => out.push('_'),
            c if c.is_ascii() => out.push(c),
            c => match fold_char(c) {
                Some(folded) => out.push_str(folded),
                None => out.push('_'),
            },
        }
    }
    let trimmed = out.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

fn or_unknown<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

/// `Artist/Album/NN Title.ext`, relative to the collection root.
pub fn organized_path(meta: &TrackMetadata, ext: &str) -> PathBuf {
    let artist = sanitize_component(or_unknown(&meta.artist, "Unknown Artist"));
    let album = sanitize_component(or_unknown(&meta.album, "Unknown Album"));
    let title = sanitize_component(or_unknown(&meta.title, "Untitled"));
    let file = if ext.is_empty() {
        format!("{:02} {title}", meta.track_number.max(0))
    } else {
        format!("{:02} {title}.{}", meta.track_number.max(0), ext.to_ascii_lowercase())
    };
    PathBuf::from(artist).join(album).join(file)
}

/// First of `path`, `stem_1.ext`, `stem_2.ext`, ... that does not exist yet.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());
    (1..)
        .map(|n| {
            let name = match &ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            path.with_file_name(name)
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Remove now-empty directories from `start` up to, not including, `root`.
pub fn prune_empty_dirs(start: Option<&Path>, root: &Path) {
    let mut current = start;
    while let Some(dir) = current {
        if dir == root || !dir.starts_with(root) {
            break;
        }
        // Fails (and stops) on the first non-empty directory.
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}
