//! # xlrows
//!
//! Minimal reader for XLSX worksheets.
//!
//! Opens an Office Open XML spreadsheet, loads its shared strings table and
//! returns the first worksheet as rows of resolved cell values. Read-only,
//! single sheet, values only: no styles, formulas or merged cells.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xlrows::read_table;
//!
//! let table = read_table("precinct_results.xlsx")?;
//! println!("Rows: {}", table.len());
//!
//! if let Some(header) = table.position(|row| row.first().is_some_and(|c| c.contains("Precinct"))) {
//!     for row in &table.rows()[header + 1..] {
//!         println!("{:?}", row);
//!     }
//! }
//! # Ok::<(), xlrows::Error>(())
//! ```
//!
//! ## Step by Step
//!
//! ```no_run
//! use xlrows::container::Package;
//! use xlrows::xlsx::{read_worksheet, SharedStrings};
//! use xlrows::ReadOptions;
//!
//! let package = Package::open("precinct_results.xlsx")?;
//! let shared_strings = SharedStrings::load(&package)?;
//! let table = read_worksheet(&package, &shared_strings, &ReadOptions::default())?;
//! # Ok::<(), xlrows::Error>(())
//! ```

pub mod container;
pub mod error;
pub mod model;
pub mod options;
pub mod xlsx;

#[cfg(test)]
mod fixtures;

// Re-exports
pub use container::Package;
pub use error::{Error, Result};
pub use model::{Row, Table};
pub use options::{ColumnAlignment, ReadOptions};
pub use xlsx::{SharedStrings, SheetReader};

use std::path::Path;

/// Read the first worksheet of an XLSX file.
///
/// The package is closed before this returns, whether reading succeeded or
/// not.
///
/// # Example
///
/// ```no_run
/// let table = xlrows::read_table("results.xlsx")?;
/// for row in &table {
///     println!("{}", row.join(","));
/// }
/// # Ok::<(), xlrows::Error>(())
/// ```
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    read_table_with_options(path, &ReadOptions::default())
}

/// Read the first worksheet of an XLSX file with options.
///
/// # Example
///
/// ```no_run
/// use xlrows::{read_table_with_options, ColumnAlignment, ReadOptions};
///
/// let options = ReadOptions::new().with_column_alignment(ColumnAlignment::Reference);
/// let table = read_table_with_options("results.xlsx", &options)?;
/// # Ok::<(), xlrows::Error>(())
/// ```
pub fn read_table_with_options(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Table> {
    SheetReader::open(path)?
        .with_options(options.clone())
        .read_table()
}

/// Read the first worksheet of an in-memory XLSX file.
pub fn read_table_from_bytes(data: &[u8]) -> Result<Table> {
    SheetReader::from_bytes(data.to_vec())?.read_table()
}
