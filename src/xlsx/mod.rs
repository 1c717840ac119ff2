//! XLSX (Excel) worksheet reader.
//!
//! Reads the first worksheet of an Office Open XML spreadsheet into a
//! [`Table`], resolving shared-string references along the way.
//!
//! # Example
//!
//! ```no_run
//! use xlrows::xlsx::SheetReader;
//!
//! let reader = SheetReader::open("results.xlsx")?;
//! let table = reader.read_table()?;
//!
//! for row in &table {
//!     println!("{}", row.join(" | "));
//! }
//! # Ok::<(), xlrows::Error>(())
//! ```

mod cell_ref;
mod shared_strings;
mod worksheet;

pub use cell_ref::{column_index, MAX_COLUMNS};
pub use shared_strings::SharedStrings;
pub use worksheet::{parse_worksheet, read_worksheet, resolve_cell_value};

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use crate::container::Package;
use crate::error::{Error, Result};
use crate::model::Table;
use crate::options::ReadOptions;

/// SpreadsheetML main namespace.
pub const SPREADSHEET_NS: &[u8] = b"http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// Shared strings part. Optional.
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// First worksheet part. Required.
pub const FIRST_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

fn is_spreadsheet_ns(ns: &ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(uri)) if *uri == SPREADSHEET_NS)
}

/// Document-level well-formedness of one XML part.
///
/// The event reader checks tag nesting. On top of that a part must have a
/// single root with only whitespace around it, and every element prefix,
/// attribute and entity must be valid whether or not the caller uses it.
struct Outline {
    part: &'static str,
    depth: usize,
    seen_root: bool,
    root_closed: bool,
}

impl Outline {
    fn new(part: &'static str) -> Self {
        Self {
            part,
            depth: 0,
            seen_root: false,
            root_closed: false,
        }
    }

    fn check(&mut self, ns: &ResolveResult<'_>, event: &Event<'_>) -> Result<()> {
        match event {
            Event::Start(e) | Event::Empty(e) => {
                if self.root_closed {
                    return Err(self.error("element after the root element".to_string()));
                }
                if let ResolveResult::Unknown(prefix) = ns {
                    return Err(self.error(format!(
                        "unbound namespace prefix {:?}",
                        String::from_utf8_lossy(prefix)
                    )));
                }
                for attr in e.attributes() {
                    attr?.unescape_value()?;
                }

                self.seen_root = true;
                if matches!(event, Event::Start(_)) {
                    self.depth += 1;
                } else if self.depth == 0 {
                    self.root_closed = true;
                }
            }
            Event::End(_) => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.root_closed = true;
                }
            }
            Event::Text(e) => {
                if self.depth == 0 && !e.iter().all(u8::is_ascii_whitespace) {
                    return Err(self.error("text outside the root element".to_string()));
                }
                e.unescape()?;
            }
            Event::CData(_) if self.depth == 0 => {
                return Err(self.error("CDATA outside the root element".to_string()));
            }
            Event::DocType(_) if self.seen_root => {
                return Err(self.error("DOCTYPE after the root element".to_string()));
            }
            _ => {}
        }
        Ok(())
    }

    /// Check the document as a whole once the reader reaches EOF.
    fn finish(&self) -> Result<()> {
        if !self.seen_root {
            return Err(self.error("no root element".to_string()));
        }
        if self.depth != 0 {
            return Err(self.error("unexpected end of document".to_string()));
        }
        Ok(())
    }

    fn error(&self, message: String) -> Error {
        Error::Format(format!("{}: {}", self.part, message))
    }
}

/// Reader for the first worksheet of an XLSX package.
///
/// Owns the package and its shared strings table. Reading does not change
/// the reader, so [`SheetReader::read_table`] can be called repeatedly.
pub struct SheetReader<R = BufReader<File>> {
    package: Package<R>,
    shared_strings: SharedStrings,
    options: ReadOptions,
}

impl SheetReader {
    /// Open an XLSX file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package(package)
    }
}

impl SheetReader<Cursor<Vec<u8>>> {
    /// Create a reader from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let package = Package::from_bytes(data)?;
        Self::from_package(package)
    }
}

impl<R: Read + Seek> SheetReader<R> {
    /// Create a reader from an opened package, loading its shared strings.
    pub fn from_package(package: Package<R>) -> Result<Self> {
        let shared_strings = SharedStrings::load(&package)?;
        Ok(Self {
            package,
            shared_strings,
            options: ReadOptions::default(),
        })
    }

    /// Replace the reading options.
    pub fn with_options(mut self, options: ReadOptions) -> Self {
        self.options = options;
        self
    }

    /// Read the first worksheet into a table.
    pub fn read_table(&self) -> Result<Table> {
        read_worksheet(&self.package, &self.shared_strings, &self.options)
    }

    /// Get a reference to the package.
    pub fn package(&self) -> &Package<R> {
        &self.package
    }

    /// Get the shared strings table.
    pub fn shared_strings(&self) -> &SharedStrings {
        &self.shared_strings
    }

    /// Get the reading options.
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }
}
