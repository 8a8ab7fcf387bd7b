//! Token kinds shared by the header parser and the SQL body scanner.
//!
//! The set is deliberately small: headers need punctuation and identifiers,
//! bodies need placeholders, comparison operators and enough structure to
//! find clauses. Everything else collapses into `Operator` or `Garbage`.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    /// `?{` opens an optional marker
    #[token("?{")]
    OptionalOpen,

    /// `!{` opens an exactly-one marker
    #[token("!{")]
    ExactOpen,

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,

    #[token(".")]
    Dot,

    #[token("*")]
    Star,

    #[token("::")]
    DoubleColon,

    #[token(":")]
    Colon,

    /// `$1`, `$2`, ...
    #[regex(r"\$[0-9]+")]
    PositionalParam,

    /// `:name`
    #[regex(r":[A-Za-z_][A-Za-z0-9_]*")]
    NamedParam,

    #[token("=")]
    Eq,

    #[token("<>")]
    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("-")]
    Minus,

    /// Any other operator run (`+`, `||`, `->>`, `@>`, ...).
    #[regex(r"[+/%^&|~#@?]+")]
    Operator,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r#""(?:[^"]|"")*""#)]
    QuotedIdent,

    /// `'...'`, or dollar-quoted `$$...$$` / `$tag$...$tag$`
    #[regex(r"'(?:[^']|'')*'")]
    #[regex(r"\$(?:[A-Za-z_][A-Za-z0-9_]*)?\$", dollar_quoted)]
    StringLiteral,

    #[regex(r"[0-9]+(?:\.[0-9]*)?")]
    Number,

    #[regex(r"[ \t\r\x0C]+")]
    Whitespace,

    #[token("\n")]
    #[token("\r\n")]
    Newline,

    #[regex(r"--[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
    BlockComment,

    /// Coalesced unrecognized characters
    Garbage,
}

/// Consumes the body of a dollar-quoted string up to the closing tag.
/// An unclosed quote is not a string.
fn dollar_quoted(lex: &mut logos::Lexer<'_, TokenKind>) -> bool {
    let tag = lex.slice();
    let Some(end) = lex.remainder().find(tag) else {
        return false;
    };
    let len = end + tag.len();
    lex.bump(len);
    true
}

use TokenKind::*;

impl TokenKind {
    #[inline]
    pub fn is_trivia(self) -> bool {
        matches!(self, Whitespace | Newline | LineComment | BlockComment)
    }

    #[inline]
    pub fn is_param(self) -> bool {
        matches!(self, PositionalParam | NamedParam)
    }

    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(self, Eq | NotEq | Lt | LtEq | Gt | GtEq)
    }

    #[inline]
    pub fn is_word(self) -> bool {
        matches!(self, Ident | QuotedIdent)
    }
}
