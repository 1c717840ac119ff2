//! A1-style cell reference parsing.

use crate::error::{Error, Result};

/// Number of columns in a worksheet (A through XFD).
pub const MAX_COLUMNS: usize = 16_384;

/// Zero-based column index of an A1-style reference (`"C7"` -> 2).
///
/// Letters must come first and be followed by a row number. Lowercase letters
/// are accepted; `$` markers are not, since worksheet cell references never
/// carry them.
pub fn column_index(reference: &str) -> Result<usize> {
    let invalid = || Error::Format(format!("invalid cell reference {:?}", reference));

    let split = reference
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(reference.len());
    let (letters, digits) = reference.split_at(split);

    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut col = 0usize;
    for b in letters.bytes() {
        col = col * 26 + usize::from(b.to_ascii_uppercase() - b'A' + 1);
        if col > MAX_COLUMNS {
            return Err(invalid());
        }
    }

    Ok(col - 1)
}
