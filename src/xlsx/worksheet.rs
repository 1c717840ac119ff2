//! Worksheet row and cell decoding.

use quick_xml::events::{BytesStart, Event};
use quick_xml::NsReader;
use std::io::{Read, Seek};

use super::cell_ref::column_index;
use super::shared_strings::SharedStrings;
use super::{is_spreadsheet_ns, Outline, FIRST_SHEET_PART};
use crate::container::Package;
use crate::error::{Error, Result};
use crate::model::{Row, Table};
use crate::options::{ColumnAlignment, ReadOptions};

/// A `<row>` element that has been opened but not yet closed.
struct OpenRow {
    /// Index reserved in the output so rows keep start-tag order
    slot: usize,
    depth: usize,
    cells: Vec<Placed>,
    cell: Option<OpenCell>,
}

/// A `<c>` element that has been opened but not yet closed.
struct OpenCell {
    depth: usize,
    kind: Option<String>,
    reference: Option<String>,
    /// Text of the first direct `<v>` child, once one has been seen
    value: Option<String>,
    collecting: bool,
}

/// A resolved value and the reference it was declared at.
struct Placed {
    reference: Option<String>,
    value: String,
}

impl OpenCell {
    fn from_start(e: &BytesStart<'_>, depth: usize) -> Result<Self> {
        let mut kind = None;
        let mut reference = None;

        for attr in e.attributes() {
            let attr = attr?;
            match attr.key.as_ref() {
                b"t" => kind = Some(attr.unescape_value()?.into_owned()),
                b"r" => reference = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            depth,
            kind,
            reference,
            value: None,
            collecting: false,
        })
    }

    fn finish(self, shared_strings: &SharedStrings) -> Result<Placed> {
        let value = resolve_cell_value(self.kind.as_deref(), self.value.as_deref(), shared_strings)?;
        Ok(Placed {
            reference: self.reference,
            value,
        })
    }
}

/// Resolve one cell to its display value.
///
/// A shared-string cell (`t="s"`) holds an index into the shared strings
/// table; an index past the end gives an empty string. Any other cell yields
/// its raw value verbatim. A cell without a value element is empty.
pub fn resolve_cell_value(
    kind: Option<&str>,
    value: Option<&str>,
    shared_strings: &SharedStrings,
) -> Result<String> {
    let Some(raw) = value else {
        return Ok(String::new());
    };

    if kind != Some("s") {
        return Ok(raw.to_string());
    }

    let digits = raw.trim_matches(|c: char| c.is_ascii_whitespace());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Format(format!(
            "shared string index {:?} is not a non-negative integer",
            raw
        )));
    }

    // Too many digits for usize is still a well-formed index, just out of range.
    let resolved = digits
        .parse::<usize>()
        .ok()
        .and_then(|idx| shared_strings.get(idx))
        .unwrap_or("");
    Ok(resolved.to_string())
}

/// Read the first worksheet of a package into a table.
pub fn read_worksheet<R: Read + Seek>(
    package: &Package<R>,
    shared_strings: &SharedStrings,
    options: &ReadOptions,
) -> Result<Table> {
    let xml = package.read_xml(FIRST_SHEET_PART)?;
    let table = parse_worksheet(&xml, shared_strings, options)?;
    log::debug!("decoded {} rows from {}", table.len(), FIRST_SHEET_PART);
    Ok(table)
}

/// Decode worksheet XML into a table.
///
/// Every `<row>` in the spreadsheet namespace is collected regardless of how
/// deeply it is nested under the root. Within a row only direct `<c>` children
/// count, and within a cell only its first direct `<v>` child.
pub fn parse_worksheet(
    xml: &str,
    shared_strings: &SharedStrings,
    options: &ReadOptions,
) -> Result<Table> {
    let mut reader = NsReader::from_str(xml);

    let mut buf = Vec::new();
    let mut outline = Outline::new(FIRST_SHEET_PART);
    let mut depth = 0usize;
    let mut rows: Vec<Row> = Vec::new();
    let mut open: Vec<OpenRow> = Vec::new();

    loop {
        let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
        outline.check(&ns, &event)?;
        match (ns, event) {
            (ns, Event::Start(e)) => {
                depth += 1;
                let main = is_spreadsheet_ns(&ns);
                let name = e.local_name();

                if main && name.as_ref() == b"row" {
                    open.push(OpenRow {
                        slot: rows.len(),
                        depth,
                        cells: Vec::new(),
                        cell: None,
                    });
                    rows.push(Row::new());
                } else if let Some(row) = open.last_mut() {
                    match row.cell.as_mut() {
                        None if main && depth == row.depth + 1 && name.as_ref() == b"c" => {
                            row.cell = Some(OpenCell::from_start(&e, depth)?);
                        }
                        Some(cell)
                            if main
                                && depth == cell.depth + 1
                                && name.as_ref() == b"v"
                                && cell.value.is_none() =>
                        {
                            cell.value = Some(String::new());
                            cell.collecting = true;
                        }
                        Some(cell) => cell.collecting = false,
                        None => {}
                    }
                }
            }
            (ns, Event::Empty(e)) => {
                let main = is_spreadsheet_ns(&ns);
                let name = e.local_name();
                let at = depth + 1;

                if main && name.as_ref() == b"row" {
                    rows.push(Row::new());
                } else if let Some(row) = open.last_mut() {
                    match row.cell.as_mut() {
                        None if main && at == row.depth + 1 && name.as_ref() == b"c" => {
                            let cell = OpenCell::from_start(&e, at)?;
                            row.cells.push(cell.finish(shared_strings)?);
                        }
                        Some(cell)
                            if main
                                && at == cell.depth + 1
                                && name.as_ref() == b"v"
                                && cell.value.is_none() =>
                        {
                            cell.value = Some(String::new());
                        }
                        Some(cell) => cell.collecting = false,
                        None => {}
                    }
                }
            }
            (_, Event::Text(e)) => {
                if let Some(cell) = collecting_cell(&mut open) {
                    let text = e.unescape()?;
                    cell.value.get_or_insert_with(String::new).push_str(&text);
                }
            }
            (_, Event::CData(e)) => {
                if let Some(cell) = collecting_cell(&mut open) {
                    let text = std::str::from_utf8(&e)
                        .map_err(|e| Error::Format(format!("{}: {}", FIRST_SHEET_PART, e)))?;
                    cell.value.get_or_insert_with(String::new).push_str(text);
                }
            }
            (_, Event::End(_)) => {
                if let Some(row) = open.last_mut() {
                    if depth == row.depth {
                        if let Some(done) = open.pop() {
                            let cells = place_cells(done.cells, options.column_alignment)?;
                            log::trace!("row {}: {} cells", done.slot, cells.len());
                            rows[done.slot] = cells;
                        }
                    } else if row.cell.as_ref().is_some_and(|c| c.depth == depth) {
                        if let Some(cell) = row.cell.take() {
                            row.cells.push(cell.finish(shared_strings)?);
                        }
                    } else if let Some(cell) = row.cell.as_mut() {
                        if depth == cell.depth + 1 {
                            cell.collecting = false;
                        }
                    }
                }
                depth -= 1;
            }
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    outline.finish()?;
    Ok(Table::from(rows))
}

/// The innermost open cell, if it is reading `<v>` text.
fn collecting_cell(open: &mut [OpenRow]) -> Option<&mut OpenCell> {
    open.last_mut()
        .and_then(|row| row.cell.as_mut())
        .filter(|cell| cell.collecting)
}

/// Lay out a row's resolved cells.
fn place_cells(cells: Vec<Placed>, alignment: ColumnAlignment) -> Result<Row> {
    match alignment {
        ColumnAlignment::Positional => Ok(cells.into_iter().map(|c| c.value).collect()),
        ColumnAlignment::Reference => {
            let mut row = Row::with_capacity(cells.len());
            for cell in cells {
                let col = match cell.reference.as_deref() {
                    Some(r) => column_index(r)?,
                    None => row.len(),
                };
                if col < row.len() {
                    return Err(Error::Format(format!(
                        "cell {:?} is out of column order",
                        cell.reference.unwrap_or_default()
                    )));
                }
                row.resize(col, String::new());
                row.push(cell.value);
            }
            Ok(row)
        }
    }
}
