//! Sort and column configuration for a collection's tabular view.
//!
//! A `DisplayDescriptor` is a plain value. Collections share it behind an
//! `Arc` and writers swap in a new one instead of mutating it.

use std::cmp::Ordering;

use serde::Deserialize;

use crate::track::Track;

/// Logical columns a track can be sorted or displayed by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Column {
    Artist,
    Album,
    Title,
    #[serde(alias = "disc")]
    DiscNumber,
    #[serde(alias = "track")]
    TrackNumber,
    #[serde(alias = "tracks")]
    TrackCount,
    Length,
    Year,
}

impl Column {
    /// Short header text.
    pub fn short_name(self) -> &'static str {
        match self {
            Column::Artist => "Artist",
            Column::Album => "Album",
            Column::Title => "Title",
            Column::DiscNumber => "Disc",
            Column::TrackNumber => "#",
            Column::TrackCount => "Of",
            Column::Length => "Length",
            Column::Year => "Year",
        }
    }

    /// Parse a column name as accepted on the command line.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "artist" => Some(Column::Artist),
            "album" => Some(Column::Album),
            "title" => Some(Column::Title),
            "disc" | "disc-number" => Some(Column::DiscNumber),
            "track" | "track-number" => Some(Column::TrackNumber),
            "tracks" | "track-count" => Some(Column::TrackCount),
            "length" => Some(Column::Length),
            "year" => Some(Column::Year),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayDescriptor {
    pub sort_order: SortOrder,
    /// Priority order: the first column is the primary key.
    pub sort_columns: Vec<Column>,
    /// Display position -> logical column. Does not affect sorting.
    pub display_columns: Vec<Column>,
}

impl Default for DisplayDescriptor {
    fn default() -> Self {
        Self {
            sort_order: SortOrder::Ascending,
            sort_columns: vec![
                Column::Artist,
                Column::Album,
                Column::DiscNumber,
                Column::TrackNumber,
            ],
            display_columns: vec![
                Column::Artist,
                Column::Album,
                Column::TrackNumber,
                Column::Title,
                Column::Length,
            ],
        }
    }
}

impl DisplayDescriptor {
    /// Compare two tracks column by column; the first difference wins.
    ///
    /// The sort order flips the whole result, not individual columns.
    pub fn compare(&self, a: &Track, b: &Track) -> Ordering {
        let ord = self
            .sort_columns
            .iter()
            .map(|&c| a.column(c).compare(&b.column(c)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal);
        match self.sort_order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    }

    pub fn column_count(&self) -> usize {
        self.display_columns.len()
    }

    pub fn column_at(&self, index: usize) -> Option<Column> {
        self.display_columns.get(index).copied()
    }

    pub fn header(&self, index: usize) -> Option<&'static str> {
        self.column_at(index).map(Column::short_name)
    }
}
