//! XLSX shared strings parsing.

use quick_xml::events::Event;
use quick_xml::NsReader;
use std::io::{Read, Seek};

use super::{is_spreadsheet_ns, Outline, SHARED_STRINGS_PART};
use crate::container::Package;
use crate::error::{Error, Result};

/// Shared strings table.
///
/// Entries are indexed by position, matching `<si>` document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedStrings {
    /// All strings in order
    strings: Vec<String>,
}

/// Progress through one `<si>` item.
#[derive(Default)]
struct Item {
    /// Text of the first direct `<t>` child, once one has been seen
    text: Option<String>,
    /// Inside that `<t>` and before any child element of it
    collecting: bool,
}

impl SharedStrings {
    /// Load the shared strings part of a package.
    ///
    /// A package without `xl/sharedStrings.xml` yields an empty table.
    pub fn load<R: Read + Seek>(package: &Package<R>) -> Result<Self> {
        match package.read_xml(SHARED_STRINGS_PART) {
            Ok(xml) => {
                let table = Self::parse(&xml)?;
                log::debug!("loaded {} shared strings", table.len());
                Ok(table)
            }
            Err(Error::PartNotFound(_)) => {
                log::debug!("no shared strings part, using an empty table");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Parse shared strings from XML content.
    ///
    /// Each `<si>` child of the root contributes the text of its first direct
    /// `<t>` child, or an empty string when it has none. Rich text runs
    /// (`<si><r><t>..</t></r></si>`) are not direct children and so resolve to
    /// an empty string. Text is kept exactly, whitespace included.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut strings = Vec::new();
        let mut reader = NsReader::from_str(xml);

        let mut buf = Vec::new();
        let mut outline = Outline::new(SHARED_STRINGS_PART);
        let mut depth = 0usize;
        let mut item: Option<Item> = None;

        loop {
            let (ns, event) = reader.read_resolved_event_into(&mut buf)?;
            outline.check(&ns, &event)?;
            match (ns, event) {
                (ns, Event::Start(e)) => {
                    depth += 1;
                    let main = is_spreadsheet_ns(&ns);
                    let name = e.local_name();
                    if main && depth == 2 && name.as_ref() == b"si" {
                        item = Some(Item::default());
                    } else if let Some(it) = item.as_mut() {
                        if main && depth == 3 && name.as_ref() == b"t" && it.text.is_none() {
                            it.text = Some(String::new());
                            it.collecting = true;
                        } else {
                            // Markup inside <t> ends its leading text.
                            it.collecting = false;
                        }
                    }
                }
                (ns, Event::Empty(e)) => {
                    let main = is_spreadsheet_ns(&ns);
                    let name = e.local_name();
                    if main && depth + 1 == 2 && name.as_ref() == b"si" {
                        strings.push(String::new());
                    } else if let Some(it) = item.as_mut() {
                        if main && depth + 1 == 3 && name.as_ref() == b"t" && it.text.is_none() {
                            it.text = Some(String::new());
                        } else {
                            it.collecting = false;
                        }
                    }
                }
                (_, Event::Text(e)) => {
                    if let Some(Item {
                        text: Some(text),
                        collecting: true,
                    }) = item.as_mut()
                    {
                        text.push_str(&e.unescape()?);
                    }
                }
                (_, Event::CData(e)) => {
                    if let Some(Item {
                        text: Some(text),
                        collecting: true,
                    }) = item.as_mut()
                    {
                        let raw = std::str::from_utf8(&e)
                            .map_err(|e| Error::Format(format!("{}: {}", SHARED_STRINGS_PART, e)))?;
                        text.push_str(raw);
                    }
                }
                (_, Event::End(_)) => {
                    if depth == 2 {
                        if let Some(done) = item.take() {
                            strings.push(done.text.unwrap_or_default());
                        }
                    } else if depth == 3 {
                        if let Some(it) = item.as_mut() {
                            it.collecting = false;
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
        Ok(Self { strings })
    }

    /// Get a string by index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(|s| s.as_str())
    }

    /// Get the count of shared strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over the strings in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for SharedStrings {
    fn from(strings: Vec<String>) -> Self {
        Self { strings }
    }
}
