//! In-memory packages for unit tests.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::container::Package;

/// Build a ZIP archive holding the given parts.
pub fn build_archive_bytes(parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Build a ZIP archive holding the given XML parts.
pub fn build_archive(parts: &[(&str, &str)]) -> Vec<u8> {
    let parts: Vec<(&str, &[u8])> = parts
        .iter()
        .map(|(name, xml)| (*name, xml.as_bytes()))
        .collect();
    build_archive_bytes(&parts)
}

/// Open an in-memory package holding the given XML parts.
pub fn package(parts: &[(&str, &str)]) -> Package<Cursor<Vec<u8>>> {
    Package::from_bytes(build_archive(parts)).unwrap()
}

/// Wrap `<row>` markup in a minimal worksheet document.
pub fn worksheet(rows: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        rows
    )
}

/// Wrap plain strings in a shared-strings document.
pub fn shared_strings(items: &[&str]) -> String {
    let body: String = items
        .iter()
        .map(|s| format!("<si><t>{}</t></si>", s))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
        items.len(),
        body
    )
}
