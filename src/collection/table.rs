//! Tabular projection of a collection for the presentation layer.

use crate::track::{Track, cell_text};

use super::state::CollectionState;

impl CollectionState {
    pub fn row_count(&self) -> usize {
        self.len()
    }

    /// Number of display columns; zero without a descriptor.
    pub fn column_count(&self) -> usize {
        self.display().map_or(0, |d| d.column_count())
    }

    pub fn header(&self, column: usize) -> Option<&'static str> {
        self.display().and_then(|d| d.header(column))
    }

    pub fn track_at(&self, row: usize) -> Option<&Track> {
        self.order_index(row)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<String> {
        let col = self.display()?.column_at(column)?;
        self.track_at(row).map(|t| cell_text(t, col))
    }

    pub fn row(&self, row: usize) -> Vec<String> {
        (0..self.column_count())
            .filter_map(|c| self.cell(row, c))
            .collect()
    }

    pub fn headers(&self) -> Vec<String> {
        (0..self.column_count())
            .filter_map(|c| self.header(c).map(str::to_string))
            .collect()
    }
}
