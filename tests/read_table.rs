//! End-to-end reads of XLSX packages written to disk.

use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::TempDir;
use xlrows::container::Package;
use xlrows::xlsx::{read_worksheet, SharedStrings, FIRST_SHEET_PART, SHARED_STRINGS_PART};
use xlrows::{
    read_table, read_table_with_options, ColumnAlignment, Error, ReadOptions, SheetReader, Table,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Results" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

/// Write an XLSX package with the usual scaffolding plus the given parts.
fn write_xlsx(dir: &TempDir, file_name: &str, parts: &[(&str, &str)]) -> PathBuf {
    let path = dir.path().join(file_name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    zip.start_file("xl/workbook.xml", options).unwrap();
    zip.write_all(WORKBOOK.as_bytes()).unwrap();

    for (name, xml) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    path
}

fn shared_strings(items: &[&str]) -> String {
    let body: String = items.iter().map(|s| format!("<si><t>{}</t></si>", s)).collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">{1}</sst>"#,
        items.len(),
        body
    )
}

fn worksheet(rows: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <dimension ref="A1:D6"/>
  <sheetViews><sheetView workbookViewId="0"/></sheetViews>
  <sheetData>{}</sheetData>
  <pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
</worksheet>"#,
        rows
    )
}

fn table(rows: &[&[&str]]) -> Table {
    Table::from(
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect::<Vec<_>>(),
    )
}

#[test]
fn test_shared_strings_and_literals() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "results.xlsx",
        &[
            (SHARED_STRINGS_PART, &shared_strings(&["Ward 1", "Alice", "Bob"])),
            (
                FIRST_SHEET_PART,
                &worksheet(
                    r#"<row r="1" spans="1:3"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1"><v>42</v></c></row>"#,
                ),
            ),
        ],
    );

    assert_eq!(read_table(&path).unwrap(), table(&[&["Ward 1", "Alice", "42"]]));
}

#[test]
fn test_no_shared_strings_part() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "numbers.xlsx",
        &[(FIRST_SHEET_PART, &worksheet(r#"<row r="1"><c r="A1"><v>3.14</v></c></row>"#))],
    );

    assert_eq!(read_table(&path).unwrap(), table(&[&["3.14"]]));
}

#[test]
fn test_index_past_end_is_empty() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "short.xlsx",
        &[
            (SHARED_STRINGS_PART, &shared_strings(&["a", "b"])),
            (FIRST_SHEET_PART, &worksheet(r#"<row><c t="s"><v>5</v></c></row>"#)),
        ],
    );

    assert_eq!(read_table(&path).unwrap(), table(&[&[""]]));
}

#[test]
fn test_missing_worksheet() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "nosheet.xlsx",
        &[
            (SHARED_STRINGS_PART, &shared_strings(&["a"])),
            ("xl/worksheets/sheet2.xml", &worksheet(r#"<row><c><v>1</v></c></row>"#)),
        ],
    );

    let err = read_table(&path).unwrap_err();
    assert!(matches!(err, Error::PartNotFound(ref p) if p == FIRST_SHEET_PART));
}

#[test]
fn test_row_count_and_order() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "precincts.xlsx",
        &[
            (
                SHARED_STRINGS_PART,
                &shared_strings(&["City of Madison", "Precinct", "Alice", "Bob", "Ward 1", "Ward 2", "Total"]),
            ),
            (
                FIRST_SHEET_PART,
                &worksheet(concat!(
                    r#"<row r="1"><c r="A1" t="s"><v>0</v></c></row>"#,
                    r#"<row r="2"/>"#,
                    r#"<row r="3"><c r="A3" t="s"><v>1</v></c><c r="B3" t="s"><v>2</v></c><c r="C3" t="s"><v>3</v></c></row>"#,
                    r#"<row r="4"><c r="A4" t="s"><v>4</v></c><c r="B4"><v>120</v></c><c r="C4"><v>87</v></c></row>"#,
                    r#"<row r="5"><c r="A5" t="s"><v>5</v></c><c r="B5"><v>95</v></c><c r="C5"><v>101</v></c></row>"#,
                    r#"<row r="6"><c r="A6" t="s"><v>6</v></c><c r="B6"><v>215</v></c><c r="C6"><v>188</v></c></row>"#,
                )),
            ),
        ],
    );

    let result = read_table(&path).unwrap();
    assert_eq!(
        result,
        table(&[
            &["City of Madison"],
            &[],
            &["Precinct", "Alice", "Bob"],
            &["Ward 1", "120", "87"],
            &["Ward 2", "95", "101"],
            &["Total", "215", "188"],
        ])
    );
}

#[test]
fn test_reading_twice_is_identical() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "twice.xlsx",
        &[
            (SHARED_STRINGS_PART, &shared_strings(&[" spaced ", "x"])),
            (
                FIRST_SHEET_PART,
                &worksheet(r#"<row><c t="s"><v>0</v></c><c/><c t="s"><v>1</v></c></row><row><c><v>-2.5E-3</v></c></row>"#),
            ),
        ],
    );

    let first = read_table(&path).unwrap();
    let second = read_table(&path).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.get(0).unwrap()[0], " spaced ");
}

#[test]
fn test_reference_alignment() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "sparse.xlsx",
        &[(
            FIRST_SHEET_PART,
            &worksheet(r#"<row r="1"><c r="A1"><v>1</v></c><c r="C1"><v>3</v></c></row>"#),
        )],
    );

    let positional = read_table(&path).unwrap();
    assert_eq!(positional, table(&[&["1", "3"]]));

    let options = ReadOptions::new().with_column_alignment(ColumnAlignment::Reference);
    let aligned = read_table_with_options(&path, &options).unwrap();
    assert_eq!(aligned, table(&[&["1", "", "3"]]));
}

#[test]
fn test_not_a_zip_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("precinct_results.xls");
    std::fs::write(&path, b"\xD0\xCF\x11\xE0\xA1\xB1\x1A\xE1 legacy binary workbook").unwrap();

    assert!(matches!(read_table(&path), Err(Error::Archive(_))));
}

#[test]
fn test_extension_not_checked() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "precinct_results.xls",
        &[(FIRST_SHEET_PART, &worksheet(r#"<row><c><v>ok</v></c></row>"#))],
    );

    assert_eq!(read_table(&path).unwrap(), table(&[&["ok"]]));
}

#[test]
fn test_malformed_worksheet_returns_no_table() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "broken.xlsx",
        &[(FIRST_SHEET_PART, &worksheet(r#"<row><c><v>1</v></row>"#))],
    );

    assert!(matches!(read_table(&path), Err(Error::Format(_))));
}

#[test]
fn test_step_by_step_api() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "steps.xlsx",
        &[
            (SHARED_STRINGS_PART, &shared_strings(&["Precinct"])),
            (FIRST_SHEET_PART, &worksheet(r#"<row><c t="s"><v>0</v></c></row>"#)),
        ],
    );

    let package = Package::open(&path).unwrap();
    assert!(package.has_part(SHARED_STRINGS_PART));
    assert!(package.has_part(FIRST_SHEET_PART));

    let strings = SharedStrings::load(&package).unwrap();
    assert_eq!(strings.get(0), Some("Precinct"));

    let result = read_worksheet(&package, &strings, &ReadOptions::default()).unwrap();
    assert_eq!(result, table(&[&["Precinct"]]));
}

/// Archive reader that records when the package lets go of it.
struct TrackedReader {
    inner: Cursor<Vec<u8>>,
    dropped: Rc<Cell<bool>>,
}

impl TrackedReader {
    fn new(data: Vec<u8>) -> (Self, Rc<Cell<bool>>) {
        let dropped = Rc::new(Cell::new(false));
        let reader = Self {
            inner: Cursor::new(data),
            dropped: Rc::clone(&dropped),
        };
        (reader, dropped)
    }
}

impl Read for TrackedReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Seek for TrackedReader {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.inner.seek(pos)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

#[test]
fn test_archive_released_when_shared_strings_are_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "bad_strings.xlsx",
        &[
            (SHARED_STRINGS_PART, "<sst><si><t>cut</si></sst>"),
            (FIRST_SHEET_PART, &worksheet(r#"<row><c><v>1</v></c></row>"#)),
        ],
    );

    let (reader, dropped) = TrackedReader::new(std::fs::read(&path).unwrap());
    let package = Package::from_reader(reader).unwrap();
    assert!(!dropped.get());

    let result = SheetReader::from_package(package);
    assert!(matches!(result, Err(Error::Format(_))));
    assert!(dropped.get());
}

#[test]
fn test_archive_released_when_worksheet_is_malformed() {
    let dir = TempDir::new().unwrap();
    let path = write_xlsx(
        &dir,
        "bad_sheet.xlsx",
        &[(FIRST_SHEET_PART, &worksheet(r#"<row><c><v>1</v></row>"#))],
    );

    let (reader, dropped) = TrackedReader::new(std::fs::read(&path).unwrap());
    let sheet = SheetReader::from_package(Package::from_reader(reader).unwrap()).unwrap();
    assert!(matches!(sheet.read_table(), Err(Error::Format(_))));
    assert!(!dropped.get());

    drop(sheet);
    assert!(dropped.get());

    // The file itself is untouched and reads the same way again.
    assert!(matches!(read_table(&path), Err(Error::Format(_))));
}
