//! The dictionary document: an ordered list of (header, content) pairs.
//!
//! Text layout, one block per entry:
//!
//! ```text
//! [+-Name-+]
//! "shop-1"
//! [+-Count-+]
//! 0
//! ```
//!
//! Content runs until the next header line or the end of the text and may
//! span several lines. Content lines that would read as a header, or that
//! start with a backslash, are written with a leading `\`.

use crate::error::{StorageError, StorageResult};
use std::fmt;
use std::str::FromStr;

const HEADER_OPEN: &str = "[+-";
const HEADER_CLOSE: &str = "-+]";
const ESCAPE: char = '\\';

/// One (header, content) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub header: String,
    pub content: String,
}

/// Ordered (header, content) pairs. Duplicate headers are kept; lookups
/// return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DictionaryDocument {
    entries: Vec<DictionaryEntry>,
}

impl DictionaryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. Headers must fit on one line.
    pub fn push(&mut self, header: &str, content: impl Into<String>) -> StorageResult<()> {
        if header.contains(['\n', '\r']) {
            return Err(StorageError::Format {
                line: 0,
                message: format!("header {header:?} spans several lines"),
            });
        }
        self.entries.push(DictionaryEntry {
            header: header.to_string(),
            content: content.into(),
        });
        Ok(())
    }

    pub fn entries(&self) -> &[DictionaryEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Content of the first entry with this header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.header == header)
            .map(|entry| entry.content.as_str())
    }

    /// Renders the document to text.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(HEADER_OPEN);
            out.push_str(&entry.header);
            out.push_str(HEADER_CLOSE);
            out.push('\n');
            for line in entry.content.split('\n') {
                if line.starts_with(HEADER_OPEN) || line.starts_with(ESCAPE) {
                    out.push(ESCAPE);
                }
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    /// Parses document text.
    pub fn parse(text: &str) -> StorageResult<Self> {
        let mut lines: Vec<&str> = text.split('\n').collect();
        if lines.last() == Some(&"") {
            lines.pop();
        }

        let mut entries = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for (index, line) in lines.into_iter().enumerate() {
            let line_no = index + 1;
            if let Some(header) = parse_header(line, line_no)? {
                if let Some((header, body)) = current.take() {
                    entries.push(DictionaryEntry {
                        header,
                        content: body.join("\n"),
                    });
                }
                current = Some((header.to_string(), Vec::new()));
                continue;
            }

            match current.as_mut() {
                Some((_, body)) => body.push(unescape(line).to_string()),
                None if line.trim().is_empty() => {}
                None => {
                    return Err(StorageError::Format {
                        line: line_no,
                        message: "content before the first header".to_string(),
                    });
                }
            }
        }

        if let Some((header, body)) = current {
            entries.push(DictionaryEntry {
                header,
                content: body.join("\n"),
            });
        }
        Ok(Self { entries })
    }
}

fn parse_header(line: &str, line_no: usize) -> StorageResult<Option<&str>> {
    if !line.starts_with(HEADER_OPEN) {
        return Ok(None);
    }
    let line = line.strip_suffix('\r').unwrap_or(line);
    let inner = line
        .strip_prefix(HEADER_OPEN)
        .and_then(|rest| rest.strip_suffix(HEADER_CLOSE))
        .ok_or_else(|| StorageError::Format {
            line: line_no,
            message: format!("unterminated header {line:?}"),
        })?;
    Ok(Some(inner))
}

fn unescape(line: &str) -> &str {
    line.strip_prefix(ESCAPE).unwrap_or(line)
}

impl fmt::Display for DictionaryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for DictionaryDocument {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a DictionaryDocument {
    type Item = &'a DictionaryEntry;
    type IntoIter = std::slice::Iter<'a, DictionaryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
