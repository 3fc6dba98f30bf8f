use crate::display::Column;

use super::model::{ColumnValue, Track};

/// Format a length in seconds as `h:mm:ss`, or `m:ss` under an hour.
pub fn format_length(seconds: i32) -> String {
    let total = seconds.max(0);
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Render one attribute of `track` for a table cell.
///
/// Zero numbers are shown as blanks, lengths are formatted as clock time.
pub fn cell_text(track: &Track, column: Column) -> String {
    match (column, track.column(column)) {
        (Column::Length, ColumnValue::Number(n)) => format_length(n as i32),
        (_, ColumnValue::Number(0)) => String::new(),
        (_, ColumnValue::Number(n)) => n.to_string(),
        (_, ColumnValue::Text(t)) => t.trim().to_string(),
    }
}
