//! Annotation lexer and query descriptor parser.
//!
//! A module is split into [`QueryBlock`]s, each header is parsed into a
//! [`QueryDescriptor`]. Errors abort the affected block only.

mod blocks;
mod descriptor;
mod header;
pub mod lexer;
pub mod token;


pub use blocks::{Blocks, HEADER_MARKER, MalformedHeader, QueryBlock};
pub use descriptor::{
    BindingStyle, Cardinality, HeaderSpans, OptionalKind, ParsedQuery, QueryDescriptor,
};
pub use header::parse_header;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::source_map::SourceId;
use lexer::significant_at;
use token::TokenKind;

/// Split a module into blocks and parse every header.
///
/// Returns the successfully parsed queries in declaration order; every
/// failure is reported to `diagnostics`.
pub fn parse_module<'s>(
    source_id: SourceId,
    text: &'s str,
    stream_suffix: &str,
    diagnostics: &mut Diagnostics,
) -> Vec<ParsedQuery<'s>> {
    let blocks = Blocks::new(text);

    let preamble = blocks.preamble();
    let stray = significant_at(&text[std::ops::Range::<usize>::from(preamble)], 0.into());
    if let (Some(first), Some(last)) = (stray.first(), stray.last()) {
        diagnostics
            .report(
                source_id,
                DiagnosticKind::SqlOutsideQuery,
                first.span.cover(last.span),
            )
            .emit();
    }

    let mut queries = Vec::new();
    for block in blocks {
        let block = match block {
            Ok(block) => block,
            Err(MalformedHeader { range }) => {
                diagnostics
                    .report(source_id, DiagnosticKind::MalformedHeader, range)
                    .emit();
                continue;
            }
        };

        let Some((descriptor, spans)) =
            parse_header(source_id, text, &block, stream_suffix, diagnostics)
        else {
            continue;
        };

        let has_sql = significant_at(block.body, block.body_range.start())
            .iter()
            .any(|t| t.kind != TokenKind::Semicolon);
        if !has_sql {
            diagnostics
                .report(source_id, DiagnosticKind::EmptyQueryBody, spans.name)
                .message(&descriptor.name)
                .emit();
            continue;
        }

        queries.push(ParsedQuery {
            descriptor,
            spans,
            source: source_id,
            body: block.body,
            body_range: block.body_range,
        });
    }

    queries
}
