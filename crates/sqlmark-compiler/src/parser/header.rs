//! Query header parser.
//!
//! ```text
//! header   := name [ '(' [ ident (',' ident)* [','] ] ')' ] modifier*
//! modifier := '?{' [ ident | number ] '}'
//!           | '!{' '}'
//! ```
//!
//! The first error aborts the header: the block is skipped and the module
//! continues with the next one.

use rowan::TextRange;

use super::blocks::QueryBlock;
use super::descriptor::{BindingStyle, Cardinality, HeaderSpans, OptionalKind, QueryDescriptor};
use super::lexer::{Token, significant_at, token_text};
use super::token::TokenKind;
use crate::diagnostics::{DiagnosticKind, Diagnostics, Span};
use crate::source_map::SourceId;

/// Outcome of one `?{...}` or `!{...}` marker.
enum Marker {
    Optional(Option<OptionalKind>),
    Exact,
}

struct HeaderParser<'s, 'd> {
    source: &'s str,
    source_id: SourceId,
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: &'d mut Diagnostics,
}

/// Parse the header of `block`. `source` is the full module text.
pub fn parse_header(
    source_id: SourceId,
    source: &str,
    block: &QueryBlock<'_>,
    stream_suffix: &str,
    diagnostics: &mut Diagnostics,
) -> Option<(QueryDescriptor, HeaderSpans)> {
    let tokens = significant_at(block.header, block.header_range.start());
    let mut parser = HeaderParser {
        source,
        source_id,
        tokens,
        pos: 0,
        diagnostics,
    };
    let (mut descriptor, mut spans) = parser.parse(block.header_range)?;
    descriptor.streaming = !stream_suffix.is_empty() && descriptor.name.ends_with(stream_suffix);
    spans.header = block.header_range;
    Some((descriptor, spans))
}

impl<'s> HeaderParser<'s, '_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn text(&self, token: &Token) -> &'s str {
        token_text(self.source, token)
    }

    fn end_of_header(&self, header: TextRange) -> TextRange {
        TextRange::empty(header.end())
    }

    fn unexpected(&mut self, token: Token, expected: &str) {
        let found = self.text(&token).to_string();
        self.diagnostics
            .report(self.source_id, DiagnosticKind::UnexpectedHeaderToken, token.span)
            .message(format!("expected {expected}, found `{found}`"))
            .emit();
    }

    fn parse(&mut self, header: TextRange) -> Option<(QueryDescriptor, HeaderSpans)> {
        let name_token = self.bump().filter(|t| t.kind == TokenKind::Ident)?;
        let mut descriptor = QueryDescriptor::new(self.text(&name_token));
        let mut spans = HeaderSpans {
            header,
            name: name_token.span,
            declared: Vec::new(),
            optional: None,
        };

        if self.peek().is_some_and(|t| t.kind == TokenKind::ParenOpen) {
            let (names, ranges) = self.parse_parameter_list(header)?;
            descriptor.binding_style = BindingStyle::ExplicitList(names);
            spans.declared = ranges;
        }

        let mut empty_optional: Option<TextRange> = None;
        let mut exact: Option<TextRange> = None;
        let mut counted: Option<TextRange> = None;

        while let Some(open) = self.peek() {
            let marker = match open.kind {
                TokenKind::OptionalOpen | TokenKind::ExactOpen => self.parse_marker(header)?,
                _ => {
                    self.unexpected(open, "`?{` or `!{`");
                    return None;
                }
            };
            let range = TextRange::new(open.span.start(), self.tokens[self.pos - 1].span.end());

            match marker {
                Marker::Exact => {
                    if let Some(prev) = exact.or(empty_optional).or(counted) {
                        self.conflict(range, prev, "row count is already constrained");
                        return None;
                    }
                    exact = Some(range);
                }
                Marker::Optional(None) => {
                    if let Some(prev) = empty_optional.or(exact) {
                        self.conflict(range, prev, "row count is already constrained");
                        return None;
                    }
                    empty_optional = Some(range);
                }
                Marker::Optional(Some(kind)) => {
                    if let Some(prev) = spans.optional {
                        self.conflict(range, prev, "optional parameters are already declared");
                        return None;
                    }
                    if matches!(descriptor.binding_style, BindingStyle::ExplicitList(_)) {
                        self.conflict(range, spans.name, "header already declares a parameter list");
                        return None;
                    }
                    if let OptionalKind::Count(_) = kind {
                        if let Some(prev) = exact {
                            self.conflict(range, prev, "row count is already constrained");
                            return None;
                        }
                        counted = Some(range);
                    }
                    if let OptionalKind::Named(_) = kind {
                        spans.declared = vec![range];
                    }
                    spans.optional = Some(range);
                    descriptor.binding_style = BindingStyle::PositionalOptional(kind);
                }
            }
        }

        descriptor.cardinality = if exact.is_some() {
            Cardinality::ExactlyOne
        } else if empty_optional.is_some() || counted.is_some() {
            Cardinality::AtMostOne
        } else {
            Cardinality::Many
        };

        Some((descriptor, spans))
    }

    fn conflict(&mut self, range: TextRange, previous: TextRange, detail: &str) {
        self.diagnostics
            .report(self.source_id, DiagnosticKind::ConflictingModifiers, range)
            .message(detail)
            .related_to("conflicts with this", Span::new(self.source_id, previous))
            .emit();
    }

    fn parse_parameter_list(&mut self, header: TextRange) -> Option<(Vec<String>, Vec<TextRange>)> {
        let open = self.bump()?;
        let mut names: Vec<String> = Vec::new();
        let mut ranges: Vec<TextRange> = Vec::new();

        loop {
            let Some(token) = self.bump() else {
                self.diagnostics
                    .report(
                        self.source_id,
                        DiagnosticKind::UnclosedParameterList,
                        self.end_of_header(header),
                    )
                    .message("parameter list is never closed")
                    .related_to("list opened here", Span::new(self.source_id, open.span))
                    .emit();
                return None;
            };

            match token.kind {
                TokenKind::ParenClose => return Some((names, ranges)),
                TokenKind::Ident => {
                    let name = self.text(&token).to_string();
                    if let Some(idx) = names.iter().position(|n| *n == name) {
                        self.diagnostics
                            .report(
                                self.source_id,
                                DiagnosticKind::DuplicateDeclaredParameter,
                                token.span,
                            )
                            .message(&name)
                            .related_to("first declared here", Span::new(self.source_id, ranges[idx]))
                            .emit();
                        return None;
                    }
                    names.push(name);
                    ranges.push(token.span);

                    match self.peek().map(|t| t.kind) {
                        Some(TokenKind::Comma) => {
                            self.pos += 1;
                        }
                        Some(TokenKind::ParenClose) | None => {}
                        Some(_) => {
                            let next = self.tokens[self.pos];
                            self.unexpected(next, "`,` or `)`");
                            return None;
                        }
                    }
                }
                _ => {
                    self.unexpected(token, "parameter name");
                    return None;
                }
            }
        }
    }

    fn parse_marker(&mut self, header: TextRange) -> Option<Marker> {
        let open = self.bump()?;
        let close = self.tokens[self.pos..]
            .iter()
            .position(|t| t.kind == TokenKind::BraceClose)
            .map(|i| self.pos + i);
        let Some(close) = close else {
            let opened = self.text(&open);
            let range = self.end_of_header(header);
            self.diagnostics
                .report(self.source_id, DiagnosticKind::UnterminatedModifier, range)
                .message(format!("`{opened}` is never closed"))
                .related_to("modifier opened here", Span::new(self.source_id, open.span))
                .emit();
            return None;
        };

        let inner: Vec<Token> = self.tokens[self.pos..close].to_vec();
        self.pos = close + 1;

        if open.kind == TokenKind::ExactOpen {
            if let Some(&token) = inner.first() {
                self.unexpected(token, "`}`");
                return None;
            }
            return Some(Marker::Exact);
        }

        match inner.as_slice() {
            [] => Some(Marker::Optional(None)),
            [token] if token.kind == TokenKind::Ident => Some(Marker::Optional(Some(
                OptionalKind::Named(self.text(token).to_string()),
            ))),
            [token] if token.kind == TokenKind::Number => match self.text(token).parse::<u32>() {
                Ok(count) => Some(Marker::Optional(Some(OptionalKind::Count(count)))),
                Err(_) => {
                    self.unexpected(*token, "a parameter count");
                    None
                }
            },
            [token] => {
                self.unexpected(*token, "parameter name or count");
                None
            }
            [_, token, ..] => {
                let token = *token;
                self.unexpected(token, "`}`");
                None
            }
        }
    }
}
