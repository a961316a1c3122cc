//! Per-page error and warning sink.
//!
//! Problems with individual drawn items never abort a page. They are
//! recorded here, mirrored to the `log` facade, and emitted with the page
//! output so consumers can tell a clean page from a degraded one.

use std::fmt;

use serde::Serialize;

/// Category of a reported problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Malformed or unusable drawing input.
    PageData,
    /// A font program couldn't be read or validated.
    FontRead,
    /// The font technology isn't supported.
    FontReadUnsupported,
    /// Glyph codes that couldn't be mapped to Unicode.
    FontMapping,
    /// Document metadata problems.
    Meta,
    /// Anything else.
    Other,
}

impl DiagnosticKind {
    /// Returns the tag used in serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::PageData => "page_data",
            DiagnosticKind::FontRead => "font_read",
            DiagnosticKind::FontReadUnsupported => "font_read_unsupported",
            DiagnosticKind::FontMapping => "font_mapping",
            DiagnosticKind::Meta => "meta",
            DiagnosticKind::Other => "other",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiagnosticKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A reported problem. Identical reports collapse into one entry with a
/// count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub kind: DiagnosticKind,
    pub module: String,
    pub message: String,
    #[serde(skip_serializing_if = "is_single")]
    pub count: u32,
}

fn is_single(count: &u32) -> bool {
    *count == 1
}

impl Diagnostic {
    fn matches(&self, severity: Severity, kind: DiagnosticKind, module: &str, message: &str) -> bool {
        self.severity == severity
            && self.kind == kind
            && self.module == module
            && self.message == message
    }
}

/// Accumulates diagnostics in report order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn error(&mut self, kind: DiagnosticKind, module: &str, message: impl Into<String>) {
        self.report(Severity::Error, kind, module, message.into());
    }

    /// Record a warning.
    pub fn warn(&mut self, kind: DiagnosticKind, module: &str, message: impl Into<String>) {
        self.report(Severity::Warning, kind, module, message.into());
    }

    fn report(&mut self, severity: Severity, kind: DiagnosticKind, module: &str, message: String) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.matches(severity, kind, module, &message))
        {
            entry.count += 1;
            log::trace!("[{}] repeated {}: {}", module, kind, message);
            return;
        }

        match severity {
            Severity::Error => log::error!("[{}] {}: {}", module, kind, message),
            Severity::Warning => log::warn!("[{}] {}: {}", module, kind, message),
        }

        self.entries.push(Diagnostic {
            severity,
            kind,
            module: module.to_string(),
            message,
            count: 1,
        });
    }

    /// Whether any error (not just a warning) was reported.
    pub fn errors_reported(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn errors_or_warnings_reported(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of distinct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.count)
            .sum()
    }
}
