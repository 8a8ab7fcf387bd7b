//! Splits a module into annotated query blocks.
//!
//! A block starts at a line whose first non-blank characters are the header
//! marker and runs until the next header line or the end of the module.
//! Splitting is lazy: [`Blocks`] walks the text line by line and can be
//! cloned to restart from the current position.

use rowan::{TextRange, TextSize};

use super::lexer::significant_at;
use super::token::TokenKind;

pub const HEADER_MARKER: &str = "--!";

/// One header plus the SQL that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryBlock<'s> {
    /// Header text after the marker, without the line terminator.
    pub header: &'s str,
    pub header_range: TextRange,
    /// The full header line, marker included.
    pub line_range: TextRange,
    pub body: &'s str,
    pub body_range: TextRange,
    pub range: TextRange,
}

/// A header line that does not start with a query name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedHeader {
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct Blocks<'s> {
    text: &'s str,
    /// Start of the next header line, if any.
    next_header: Option<usize>,
}

impl<'s> Blocks<'s> {
    pub fn new(text: &'s str) -> Self {
        Self {
            text,
            next_header: find_header_line(text, 0),
        }
    }

    /// Text before the first header.
    pub fn preamble(&self) -> TextRange {
        let end = find_header_line(self.text, 0).unwrap_or(self.text.len());
        TextRange::up_to(to_size(end))
    }
}

impl<'s> Iterator for Blocks<'s> {
    type Item = Result<QueryBlock<'s>, MalformedHeader>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_header?;
        let text = self.text;

        let line_end = text[start..].find('\n').map_or(text.len(), |i| start + i);
        let body_start = (line_end + 1).min(text.len());
        let end = find_header_line(text, body_start).unwrap_or(text.len());
        self.next_header = find_header_line(text, body_start);

        let line = text[start..line_end].strip_suffix('\r').unwrap_or(&text[start..line_end]);
        let marker_at = start + (line.len() - line.trim_start_matches([' ', '\t']).len());
        let header_start = marker_at + HEADER_MARKER.len();
        let header_end = start + line.len();

        let line_range = TextRange::new(to_size(start), to_size(header_end));
        let header_range = TextRange::new(to_size(header_start), to_size(header_end));
        let header = &text[header_start..header_end];

        let named = significant_at(header, header_range.start())
            .first()
            .is_some_and(|t| t.kind == TokenKind::Ident);
        if !named {
            return Some(Err(MalformedHeader { range: line_range }));
        }

        Some(Ok(QueryBlock {
            header,
            header_range,
            line_range,
            body: &text[body_start..end],
            body_range: TextRange::new(to_size(body_start), to_size(end)),
            range: TextRange::new(to_size(start), to_size(end)),
        }))
    }
}

fn to_size(offset: usize) -> TextSize {
    TextSize::from(offset as u32)
}

fn is_header_line(line: &str) -> bool {
    line.trim_start_matches([' ', '\t']).starts_with(HEADER_MARKER)
}

/// Byte offset of the first header line starting at or after `from`.
/// `from` must be at a line start.
fn find_header_line(text: &str, from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < text.len() {
        let line_end = text[pos..].find('\n').map_or(text.len(), |i| pos + i);
        if is_header_line(&text[pos..line_end]) {
            return Some(pos);
        }
        pos = line_end + 1;
    }
    None
}
