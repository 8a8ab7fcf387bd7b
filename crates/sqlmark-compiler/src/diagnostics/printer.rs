//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use rowan::TextRange;

use super::Diagnostics;
use super::message::Severity;
use crate::source_map::SourceMap;

/// Renders diagnostics against the sources they point into.
pub struct DiagnosticsPrinter<'a> {
    diagnostics: &'a Diagnostics,
    sources: &'a SourceMap,
    colored: bool,
}

impl<'a> DiagnosticsPrinter<'a> {
    pub fn new(diagnostics: &'a Diagnostics, sources: &'a SourceMap) -> Self {
        Self {
            diagnostics,
            sources,
            colored: false,
        }
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        if self.diagnostics.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            let source = self.sources.get(diag.span.source);
            let content = source.content;
            let path = source.kind.display_name();

            let mut snippet = Snippet::source(content)
                .line_start(1)
                .path(path)
                .annotation(
                    AnnotationKind::Primary
                        .span(adjust_range(diag.span.range, content.len()))
                        .label(&diag.message),
                );

            // Related spans in the same source share the primary snippet;
            // the rest get a note of their own.
            let mut notes = Vec::new();
            for related in &diag.related {
                if related.span.source == diag.span.source {
                    snippet = snippet.annotation(
                        AnnotationKind::Context
                            .span(adjust_range(related.span.range, content.len()))
                            .label(&related.message),
                    );
                    continue;
                }
                let other = self.sources.get(related.span.source);
                notes.push(
                    Level::NOTE.secondary_title(&related.message).element(
                        Snippet::source(other.content)
                            .line_start(1)
                            .path(other.kind.display_name())
                            .annotation(
                                AnnotationKind::Context
                                    .span(adjust_range(related.span.range, other.content.len()))
                                    .label(&related.message),
                            ),
                    ),
                );
            }

            let level = severity_to_level(diag.severity());
            let mut report: Vec<Group> = vec![level.primary_title(&diag.message).element(snippet)];
            report.extend(notes);

            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", renderer.render(&report))?;
        }

        Ok(())
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

fn adjust_range(range: TextRange, limit: usize) -> std::ops::Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();

    if start == end {
        return start..(start + 1).min(limit);
    }

    start..end
}
