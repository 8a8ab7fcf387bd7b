use rowan::TextRange;

use crate::source_map::SourceId;

/// Diagnostic kinds, grouped by the pipeline stage that reports them.
///
/// Lexical and header errors abort a single block, binder and resolver errors
/// abort a single query, catalog errors fail the build after every module ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    // Annotation lexer
    MalformedHeader,
    SqlOutsideQuery,
    EmptyQueryBody,

    // Header parser
    UnterminatedModifier,
    UnclosedParameterList,
    UnexpectedHeaderToken,
    ConflictingModifiers,
    DuplicateDeclaredParameter,

    // Parameter binder
    NonContiguousPositionalParameters,
    UndeclaredParameter,
    UnusedDeclaredParameter,
    ParameterCountMismatch,
    ConflictingTypeHints,

    // Type resolver
    UnknownRelation,
    UnknownColumn,
    AmbiguousColumn,
    UnknownType,
    AmbiguousParameterType,
    UnresolvedParameterType,
    UnknownCompositeField,
    UnsupportedExpression,

    // Catalog builder
    DuplicateQueryName,
}

impl DiagnosticKind {
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::UnusedDeclaredParameter | Self::SqlOutsideQuery => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Base message for this diagnostic kind, used when no custom message is provided.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::MalformedHeader => "query header has no name",
            Self::SqlOutsideQuery => "SQL before the first query header is ignored",
            Self::EmptyQueryBody => "query has no SQL body",

            Self::UnterminatedModifier => "missing closing `}`",
            Self::UnclosedParameterList => "missing closing `)`",
            Self::UnexpectedHeaderToken => "unexpected token in query header",
            Self::ConflictingModifiers => "conflicting header modifiers",
            Self::DuplicateDeclaredParameter => "parameter declared twice",

            Self::NonContiguousPositionalParameters => "positional parameters are not contiguous",
            Self::UndeclaredParameter => "parameter is not declared in the header",
            Self::UnusedDeclaredParameter => "declared parameter is never used",
            Self::ParameterCountMismatch => "parameter count does not match the header",
            Self::ConflictingTypeHints => "parameter is cast to different types",

            Self::UnknownRelation => "unknown relation",
            Self::UnknownColumn => "unknown column",
            Self::AmbiguousColumn => "ambiguous column reference",
            Self::UnknownType => "unknown type",
            Self::AmbiguousParameterType => "parameter is compared against different types",
            Self::UnresolvedParameterType => "cannot infer parameter type",
            Self::UnknownCompositeField => "unknown composite field",
            Self::UnsupportedExpression => "unsupported expression",

            Self::DuplicateQueryName => "duplicate query name",
        }
    }

    /// Template for custom messages. Contains `{}` placeholder for caller-provided detail.
    pub fn custom_message(&self) -> String {
        match self {
            Self::DuplicateQueryName => "query `{}` is defined more than once".to_string(),
            Self::EmptyQueryBody => "query `{}` has no SQL body".to_string(),
            Self::DuplicateDeclaredParameter => "parameter `{}` is declared twice".to_string(),
            Self::UndeclaredParameter => "`:{}` is not declared in the header".to_string(),
            Self::UnusedDeclaredParameter => "declared parameter `{}` is never used".to_string(),
            Self::UnknownRelation => "`{}` is not a known relation".to_string(),
            Self::UnknownColumn => "`{}` is not a column of any relation in scope".to_string(),
            Self::AmbiguousColumn => "column `{}` exists in more than one relation".to_string(),
            Self::UnknownType => "`{}` is not a known type".to_string(),
            Self::UnresolvedParameterType => {
                "cannot infer type of `{}`; compare it to a column or add a cast".to_string()
            }
            Self::UnterminatedModifier | Self::UnclosedParameterList => {
                format!("{}; {{}}", self.fallback_message())
            }
            _ => format!("{}: {{}}", self.fallback_message()),
        }
    }

    /// Render the final message.
    ///
    /// - `None` → returns `fallback_message()`
    /// - `Some(detail)` → returns `custom_message()` with `{}` replaced by detail
    pub fn message(&self, detail: Option<&str>) -> String {
        match detail {
            None => self.fallback_message().to_string(),
            Some(detail) => self.custom_message().replace("{}", detail),
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A range inside one source of the compilation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub source: SourceId,
    pub range: TextRange,
}

impl Span {
    pub fn new(source: SourceId, range: TextRange) -> Self {
        Self { source, range }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub(crate) span: Span,
    pub(crate) message: String,
}

impl RelatedInfo {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub(crate) kind: DiagnosticKind,
    pub(crate) span: Span,
    pub(crate) message: String,
    pub(crate) related: Vec<RelatedInfo>,
}

impl DiagnosticMessage {
    pub(crate) fn with_default_message(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            kind,
            span,
            message: kind.fallback_message().to_string(),
            related: Vec::new(),
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn related(&self) -> &[RelatedInfo] {
        &self.related
    }

    pub fn severity(&self) -> Severity {
        self.kind.default_severity()
    }

    pub(crate) fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    pub(crate) fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }
}

impl RelatedInfo {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{}: {}",
            self.severity(),
            u32::from(self.span.range.start()),
            u32::from(self.span.range.end()),
            self.message
        )?;
        for related in &self.related {
            write!(
                f,
                " (related: {} at {}..{})",
                related.message,
                u32::from(related.span.range.start()),
                u32::from(related.span.range.end())
            )?;
        }
        Ok(())
    }
}
