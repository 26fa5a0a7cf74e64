//! Line tokenization for pipe-delimited SPED records

use crate::constants::{FIELD_DELIMITER, MIN_RECORD_LINE_LEN, RECORD_CODE_LEN};
use crate::error::{Result, SpedError};

/// Split a raw line into its field values.
///
/// Trailing line terminators are stripped and the empty segments before the
/// first and after the last delimiter are dropped, so `|C100|0|1|` yields
/// `["C100", "0", "1"]`. Inner empty fields are preserved.
pub fn tokenize_line(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();

    if fields.first().is_some_and(|first| first.is_empty()) {
        fields.remove(0);
    }
    if fields.last().is_some_and(|last| last.is_empty()) {
        fields.pop();
    }
    fields
}

/// Extract the four-character record code that follows the first delimiter.
///
/// Lengths are counted in characters, so a code with non-ASCII letters is
/// returned as-is and left for the layout lookup to reject.
pub fn record_code(line_number: usize, line: &str) -> Result<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.chars().count() < MIN_RECORD_LINE_LEN {
        return Err(SpedError::parse(line_number, "Line too short", line));
    }

    // byte offsets of characters 1 and 1 + RECORD_CODE_LEN
    let mut offsets = line
        .char_indices()
        .map(|(offset, _)| offset)
        .chain([line.len()]);
    offsets
        .nth(1)
        .zip(offsets.nth(RECORD_CODE_LEN - 1))
        .and_then(|(start, end)| line.get(start..end))
        .ok_or_else(|| SpedError::parse(line_number, "Invalid record code", line))
}

/// True for lines that can carry a record: non-blank and starting with `|`
pub fn is_record_line(line: &str) -> bool {
    !line.trim().is_empty() && line.starts_with(FIELD_DELIMITER)
}
