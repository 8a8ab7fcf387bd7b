//! Significant-token view of a query body.
//!
//! Only the structure the binder and resolver need is recovered here:
//! keywords, identifiers, parenthesis nesting and type names.

use rowan::{TextRange, TextSize};

use crate::parser::lexer::{Token, significant_at};
use crate::parser::token::TokenKind;

/// Identifier as written: unquoted names match case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub exact: bool,
    pub range: TextRange,
}

impl Ident {
    pub fn matches(&self, other: &str) -> bool {
        if self.exact {
            self.name == other
        } else {
            self.name.eq_ignore_ascii_case(other)
        }
    }
}

/// A type name written in a cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    /// Normalized spelling, `"quoted"` names keep their quotes.
    pub name: String,
    pub range: TextRange,
}

pub struct Sql<'s> {
    body: &'s str,
    /// Offset of `body` inside its module; token spans are module-relative.
    base: TextSize,
    tokens: Vec<Token>,
    /// Index of the matching parenthesis, for every paren token.
    partner: Vec<Option<usize>>,
    /// Innermost enclosing `(`, for every token.
    enclosing: Vec<Option<usize>>,
}

const CLAUSE_KEYWORDS: &[&str] = &[
    "select", "from", "where", "join", "left", "right", "full", "inner", "cross", "natural",
    "outer", "on", "using", "group", "by", "order", "having", "limit", "offset", "union",
    "except", "intersect", "window", "for", "fetch", "returning", "set", "values", "into",
    "lateral", "default", "as", "and", "or", "not", "is", "in", "like", "ilike", "between",
    "exists", "distinct", "all", "any", "some", "case", "when", "then", "else", "end", "asc",
    "desc", "nulls", "null", "true", "false", "with", "insert", "update", "delete",
];

impl<'s> Sql<'s> {
    /// Tokens of `body`, which starts at `base` inside its module.
    pub fn new(body: &'s str, base: TextSize) -> Self {
        let tokens = significant_at(body, base);

        let mut partner = vec![None; tokens.len()];
        let mut enclosing = vec![None; tokens.len()];
        let mut stack: Vec<usize> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            enclosing[i] = stack.last().copied();
            match token.kind {
                TokenKind::ParenOpen => stack.push(i),
                TokenKind::ParenClose => {
                    if let Some(open) = stack.pop() {
                        partner[open] = Some(i);
                        partner[i] = Some(open);
                        enclosing[i] = stack.last().copied();
                    }
                }
                _ => {}
            }
        }

        Self {
            body,
            base,
            tokens,
            partner,
            enclosing,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn token(&self, i: usize) -> Option<&Token> {
        self.tokens.get(i)
    }

    pub fn kind(&self, i: usize) -> Option<TokenKind> {
        self.tokens.get(i).map(|t| t.kind)
    }

    pub fn is(&self, i: usize, kind: TokenKind) -> bool {
        self.kind(i) == Some(kind)
    }

    pub fn text(&self, i: usize) -> &'s str {
        self.tokens.get(i).map_or("", |t| self.slice(t.span))
    }

    /// Body text under a module-relative range.
    pub fn slice(&self, range: TextRange) -> &'s str {
        &self.body[std::ops::Range::<usize>::from(range - self.base)]
    }

    pub fn span(&self, i: usize) -> TextRange {
        self.tokens[i].span
    }

    /// Range covering tokens `lo..hi`.
    pub fn span_of(&self, lo: usize, hi: usize) -> TextRange {
        self.span(lo).cover(self.span(hi.max(lo + 1) - 1))
    }

    pub fn is_keyword(&self, i: usize, keyword: &str) -> bool {
        self.is(i, TokenKind::Ident) && self.text(i).eq_ignore_ascii_case(keyword)
    }

    /// Unquoted word that starts or continues a clause, never an alias.
    pub fn is_clause_keyword(&self, i: usize) -> bool {
        self.is(i, TokenKind::Ident)
            && CLAUSE_KEYWORDS
                .iter()
                .any(|kw| self.text(i).eq_ignore_ascii_case(kw))
    }

    pub fn partner(&self, i: usize) -> Option<usize> {
        self.partner.get(i).copied().flatten()
    }

    pub fn enclosing(&self, i: usize) -> Option<usize> {
        self.enclosing.get(i).copied().flatten()
    }

    /// The `(` opening the subquery that contains `i`, or `None` at statement level.
    ///
    /// A paren opens a subquery when the next token is `SELECT` or `WITH`.
    pub fn query_context(&self, i: usize) -> Option<usize> {
        let mut cursor = self.enclosing(i);
        while let Some(open) = cursor {
            if self.opens_subquery(open) {
                return Some(open);
            }
            cursor = self.enclosing(open);
        }
        None
    }

    pub fn opens_subquery(&self, open: usize) -> bool {
        self.is(open, TokenKind::ParenOpen)
            && (self.is_keyword(open + 1, "select") || self.is_keyword(open + 1, "with"))
    }

    pub fn ident(&self, i: usize) -> Option<Ident> {
        let token = self.token(i)?;
        let text = self.text(i);
        match token.kind {
            TokenKind::Ident => Some(Ident {
                name: text.to_string(),
                exact: false,
                range: token.span,
            }),
            TokenKind::QuotedIdent => Some(Ident {
                name: text[1..text.len() - 1].replace("\"\"", "\""),
                exact: true,
                range: token.span,
            }),
            _ => None,
        }
    }

    /// Parse a possibly qualified name at `i`: `name` or `schema.name`.
    /// Returns the last component and the index after it.
    pub fn object_name(&self, i: usize) -> Option<(Ident, usize)> {
        let mut ident = self.ident(i)?;
        let mut next = i + 1;
        while self.is(next, TokenKind::Dot) {
            match self.ident(next + 1) {
                Some(part) => {
                    ident = part;
                    next += 2;
                }
                None => break,
            }
        }
        Some((ident, next))
    }

    /// Parse a type name at `i`. Returns the name and the index after it.
    ///
    /// Handles multi-word names (`double precision`, `character varying`,
    /// `timestamp with time zone`), a `(n[, m])` modifier which is dropped,
    /// and trailing `[]` array suffixes.
    pub fn type_name(&self, i: usize) -> Option<(TypeName, usize)> {
        let first = self.token(i)?;
        let mut next = i + 1;
        let mut name = match first.kind {
            TokenKind::Ident => self.text(i).to_ascii_lowercase(),
            TokenKind::QuotedIdent => self.text(i).to_string(),
            _ => return None,
        };

        // schema-qualified names keep only the type
        while self.is(next, TokenKind::Dot) && self.ident(next + 1).is_some() {
            name = match self.kind(next + 1) {
                Some(TokenKind::QuotedIdent) => self.text(next + 1).to_string(),
                _ => self.text(next + 1).to_ascii_lowercase(),
            };
            next += 2;
        }

        let base = name.clone();
        match base.as_str() {
            "double" if self.is_keyword(next, "precision") => {
                name.push_str(" precision");
                next += 1;
            }
            "character" if self.is_keyword(next, "varying") => {
                name = "varchar".to_string();
                next += 1;
            }
            "timestamp" | "time" => {
                if self.is_keyword(next, "with")
                    && self.is_keyword(next + 1, "time")
                    && self.is_keyword(next + 2, "zone")
                {
                    if base == "timestamp" {
                        name = "timestamptz".to_string();
                    }
                    next += 3;
                } else if self.is_keyword(next, "without")
                    && self.is_keyword(next + 1, "time")
                    && self.is_keyword(next + 2, "zone")
                {
                    next += 3;
                }
            }
            _ => {}
        }

        if self.is(next, TokenKind::ParenOpen)
            && let Some(close) = self.partner(next)
        {
            next = close + 1;
        }

        while self.is(next, TokenKind::BracketOpen) {
            let mut close = next + 1;
            if self.is(close, TokenKind::Number) {
                close += 1;
            }
            if !self.is(close, TokenKind::BracketClose) {
                break;
            }
            name.push_str("[]");
            next = close + 1;
        }

        let range = self.span_of(i, next);
        Some((TypeName { name, range }, next))
    }

    /// Widen `lo..=hi` over wrapping parentheses: `((x))` yields the outer pair.
    pub fn unwrap_parens(&self, mut lo: usize, mut hi: usize) -> (usize, usize) {
        while lo > 0
            && self.is(lo - 1, TokenKind::ParenOpen)
            && self.partner(lo - 1) == Some(hi + 1)
            && !self.is_call(lo - 1)
        {
            lo -= 1;
            hi += 1;
        }
        (lo, hi)
    }

    /// Whether the paren at `open` is the argument list of a function call.
    pub fn is_call(&self, open: usize) -> bool {
        open > 0 && self.is(open - 1, TokenKind::Ident) && !self.is_clause_keyword(open - 1)
    }

    /// Split `lo..hi` at commas that are not nested in parentheses.
    pub fn split_commas(&self, lo: usize, hi: usize) -> Vec<(usize, usize)> {
        let mut items = Vec::new();
        let mut start = lo;
        let mut i = lo;
        while i < hi {
            match self.kind(i) {
                Some(TokenKind::ParenOpen) => {
                    i = self.partner(i).map_or(hi, |close| close + 1);
                    continue;
                }
                Some(TokenKind::Comma) => {
                    items.push((start, i));
                    start = i + 1;
                }
                _ => {}
            }
            i += 1;
        }
        if start < hi {
            items.push((start, hi));
        }
        items
    }
}
