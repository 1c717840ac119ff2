//! ZIP package access for OOXML spreadsheets.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

/// An opened OOXML package.
///
/// Wraps a random-access ZIP archive and exposes its parts by internal path
/// (for example `xl/worksheets/sheet1.xml`). The package owns its underlying
/// reader; dropping the package closes the file handle, including when a read
/// fails midway.
pub struct Package<R = BufReader<File>> {
    archive: RefCell<zip::ZipArchive<R>>,
}

impl Package {
    /// Open a package from a file path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use xlrows::container::Package;
    ///
    /// let package = Package::open("results.xlsx")?;
    /// assert!(package.has_part("xl/worksheets/sheet1.xml"));
    /// # Ok::<(), xlrows::Error>(())
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::Archive(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(BufReader::new(file))
    }
}

impl Package<Cursor<Vec<u8>>> {
    /// Create a package from an in-memory archive.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(data))
    }
}

impl<R: Read + Seek> Package<R> {
    /// Create a package from any seekable reader.
    pub fn from_reader(reader: R) -> Result<Self> {
        let archive = zip::ZipArchive::new(reader)?;
        log::debug!("opened package with {} parts", archive.len());
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Check if a part exists in the package.
    pub fn has_part(&self, name: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == name);
        found
    }

    /// Read the raw bytes of a part.
    pub fn read_part(&self, name: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut part = archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => Error::PartNotFound(name.to_string()),
            other => Error::from(other),
        })?;
        let mut data = Vec::new();
        part.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read a part and decode it to text.
    ///
    /// Handles UTF-8 (with or without BOM) and UTF-16 LE/BE.
    pub fn read_xml(&self, name: &str) -> Result<String> {
        let bytes = self.read_part(name)?;
        decode_xml_bytes(&bytes)
    }

    /// List all part names in archive order.
    pub fn part_names(&self) -> Vec<String> {
        let archive = self.archive.borrow();
        let names = archive.file_names().map(String::from).collect();
        names
    }
}

impl<R: Read + Seek> std::fmt::Debug for Package<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("parts", &self.archive.borrow().len())
            .finish()
    }
}

/// Decode XML part bytes to a string.
///
/// A byte order mark selects the encoding. Without one, UTF-8 is tried first
/// and UTF-16 is assumed only when the NUL pattern of ASCII markup shows it.
/// After transcoding from UTF-16 the declaration is rewritten to say UTF-8 so
/// the XML reader does not try to decode the text a second time.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEFu8, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec())
            .map_err(|e| Error::Format(format!("invalid UTF-8: {}", e)));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFFu8, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes).map(|s| declare_utf8(&s));
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFEu8, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes).map(|s| declare_utf8(&s));
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(utf8_err) => {
            if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 {
                decode_utf16(bytes, u16::from_le_bytes).map(|s| declare_utf8(&s))
            } else if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 {
                decode_utf16(bytes, u16::from_be_bytes).map(|s| declare_utf8(&s))
            } else {
                Err(Error::Format(format!("invalid UTF-8: {}", utf8_err)))
            }
        }
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    // A trailing odd byte cannot form a code unit.
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::Format(format!("invalid UTF-16: {}", e)))
}

/// Rewrite a UTF-16 encoding declaration as UTF-8.
fn declare_utf8(content: &str) -> String {
    let Some(end) = content
        .starts_with("<?xml")
        .then(|| content.find("?>"))
        .flatten()
    else {
        return content.to_string();
    };

    let (decl, rest) = content.split_at(end + 2);
    let decl = ["\"UTF-16\"", "'UTF-16'", "\"utf-16\"", "'utf-16'"]
        .iter()
        .fold(decl.to_string(), |d, from| d.replace(from, "\"UTF-8\""));
    format!("{}{}", decl, rest)
}
