mod message;
mod printer;


use rowan::TextRange;
use serde::Serialize;

pub use message::{DiagnosticKind, DiagnosticMessage, RelatedInfo, Severity, Span};
pub use printer::DiagnosticsPrinter;

use crate::source_map::{SourceId, SourceMap};

#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<DiagnosticMessage>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    message: DiagnosticMessage,
}

/// Flat, position-resolved view of one diagnostic for tooling output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticRecord {
    pub module: String,
    pub line: u32,
    pub column: u32,
    pub kind: String,
    pub severity: String,
    pub message: String,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Create a diagnostic with the given kind and span.
    ///
    /// Uses the kind's default message. Call `.message()` on the builder to override.
    pub fn report(
        &mut self,
        source: SourceId,
        kind: DiagnosticKind,
        range: TextRange,
    ) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            message: DiagnosticMessage::with_default_message(kind, Span::new(source, range)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_errors(&self) -> bool {
        self.messages.iter().any(|d| d.is_error())
    }

    pub fn has_warnings(&self) -> bool {
        self.messages.iter().any(|d| d.is_warning())
    }

    pub fn error_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.messages.iter().filter(|d| d.is_warning()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.messages.iter()
    }

    /// Kinds in report order. Mostly useful in tests.
    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.messages.iter().map(|m| m.kind).collect()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.messages.extend(other.messages);
    }

    /// Order by source, then by position. Stable, so same-position reports keep their order.
    pub fn sort(&mut self) {
        self.messages
            .sort_by_key(|m| (m.span.source, m.span.range.start()));
    }

    /// Resolve every diagnostic to `(module, line, column, kind, severity, message)`.
    pub fn records(&self, sources: &SourceMap) -> Vec<DiagnosticRecord> {
        self.messages
            .iter()
            .map(|m| {
                let (line, column) = sources.line_col(m.span.source, m.span.range.start());
                DiagnosticRecord {
                    module: sources.module_name(m.span.source),
                    line,
                    column,
                    kind: m.kind.to_string(),
                    severity: m.severity().to_string(),
                    message: m.message.clone(),
                }
            })
            .collect()
    }

    pub fn printer<'a>(&'a self, sources: &'a SourceMap) -> DiagnosticsPrinter<'a> {
        DiagnosticsPrinter::new(self, sources)
    }

    pub fn render(&self, sources: &SourceMap) -> String {
        self.printer(sources).render()
    }

    pub fn render_colored(&self, sources: &SourceMap, colored: bool) -> String {
        self.printer(sources).colored(colored).render()
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Provide custom detail for this diagnostic, rendered using the kind's template.
    pub fn message(mut self, msg: impl Into<String>) -> Self {
        let detail = msg.into();
        self.message.message = self.message.kind.message(Some(&detail));
        self
    }

    pub fn related_to(mut self, msg: impl Into<String>, span: Span) -> Self {
        self.message.related.push(RelatedInfo::new(span, msg));
        self
    }

    pub fn emit(self) {
        self.diagnostics.messages.push(self.message);
    }
}

impl IntoIterator for Diagnostics {
    type Item = DiagnosticMessage;
    type IntoIter = std::vec::IntoIter<DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticMessage;
    type IntoIter = std::slice::Iter<'a, DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
