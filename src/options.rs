//! Worksheet reading options.

/// How cell values are placed within a row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColumnAlignment {
    /// Values in source order, one per cell element, no padding.
    ///
    /// Rows that omit blank cells come out shorter and their later values
    /// shift left.
    #[default]
    Positional,
    /// Values placed at the column named by each cell's `r` attribute
    /// (`C7` lands at index 2), with skipped columns filled by empty strings.
    ///
    /// A cell without a reference takes the column after the previous cell.
    Reference,
}

/// Options for reading a worksheet.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Column placement mode
    pub column_alignment: ColumnAlignment,
}

impl ReadOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the column placement mode.
    pub fn with_column_alignment(mut self, alignment: ColumnAlignment) -> Self {
        self.column_alignment = alignment;
        self
    }
}
