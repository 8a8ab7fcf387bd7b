//! Lexer for headers and SQL bodies.
//!
//! Produces span-based tokens without storing text - text is sliced from the
//! module source only when needed. Spans are module-relative: a slice lexed
//! with [`lex_at`] carries the offset of the slice inside its module.
//!
//! ## Error handling
//!
//! Consecutive unrecognized characters are coalesced into a single `Garbage`
//! token rather than one error per character.

use std::ops::Range;

use logos::Logos;
use rowan::{TextRange, TextSize};

use super::token::TokenKind;

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Self { kind, span }
    }
}

fn to_text_range(range: Range<usize>, offset: TextSize) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into()) + offset
}

/// Tokenizes a whole module.
pub fn lex(source: &str) -> Vec<Token> {
    lex_at(source, TextSize::from(0))
}

/// Tokenizes `text`, which starts at `offset` inside its module.
pub fn lex_at(text: &str, offset: TextSize) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(text);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(
                        TokenKind::Garbage,
                        to_text_range(start..end, offset),
                    ));
                }
                tokens.push(Token::new(kind, to_text_range(lexer.span(), offset)));
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(
                        TokenKind::Garbage,
                        to_text_range(start..text.len(), offset),
                    ));
                }
                break;
            }
        }
    }

    tokens
}

/// Tokens of `text` with trivia removed.
pub fn significant_at(text: &str, offset: TextSize) -> Vec<Token> {
    lex_at(text, offset)
        .into_iter()
        .filter(|t| !t.kind.is_trivia())
        .collect()
}

/// Retrieves the text slice for a token. O(1) slice into the module source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[Range::<usize>::from(token.span)]
}
