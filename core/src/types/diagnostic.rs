use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "I",
            Severity::Warning => "W",
            Severity::Error => "E",
        };
        write!(f, "{}", name)
    }
}

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub enum DiagnosticKind {
    ProfileViolation,
    MandatoryAttributeMissing,
    MandatoryAttributeEmpty,
    UnexpectedValue,
    VrMismatch,
    Inconsistent,
    AlreadyIndexed,
    DefaultValue,
    InventedValue,
    Icon,
    File,
}

/// One anomaly found while processing a file
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub file: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        kind: DiagnosticKind,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn info(kind: DiagnosticKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, kind, file, message)
    }

    pub fn warning(
        kind: DiagnosticKind,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, kind, file, message)
    }

    pub fn error(kind: DiagnosticKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, kind, file, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Diagnostic sink shared by the validation and record building passes
///
/// Every pushed diagnostic is also emitted through the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic and logs it at the matching level
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!("{}", diagnostic.message),
            Severity::Warning => log::warn!("{}", diagnostic.message),
            Severity::Error => log::error!("{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, kind: DiagnosticKind, file: &str, message: impl Into<String>) {
        self.push(Diagnostic::info(kind, file, message));
    }

    pub fn warning(&mut self, kind: DiagnosticKind, file: &str, message: impl Into<String>) {
        self.push(Diagnostic::warning(kind, file, message));
    }

    pub fn error(&mut self, kind: DiagnosticKind, file: &str, message: impl Into<String>) {
        self.push(Diagnostic::error(kind, file, message));
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns whether any diagnostic of the given kind was recorded
    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    /// Iterates over the diagnostics of one file
    pub fn for_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.entries.iter().filter(move |d| d.file == file)
    }

    /// Moves all diagnostics out of `other` into this sink without logging them again
    pub fn append(&mut self, other: &mut Diagnostics) {
        self.entries.append(&mut other.entries);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_query() {
        let mut diags = Diagnostics::new();
        diags.warning(DiagnosticKind::VrMismatch, "IMG1", "VR mismatch");
        diags.error(DiagnosticKind::ProfileViolation, "IMG2", "bad transfer syntax");

        assert_eq!(diags.len(), 2);
        assert!(diags.has_kind(DiagnosticKind::ProfileViolation));
        assert!(!diags.has_kind(DiagnosticKind::Inconsistent));
        assert_eq!(diags.for_file("IMG1").count(), 1);
    }

    #[test]
    fn test_append_moves_entries() {
        let mut a = Diagnostics::new();
        let mut b = Diagnostics::new();
        b.info(DiagnosticKind::InventedValue, "IMG1", "inventing PatientID");
        a.append(&mut b);
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn test_display() {
        let d = Diagnostic::warning(DiagnosticKind::Icon, "IMG1", "cannot create icon");
        assert_eq!(d.to_string(), "W: cannot create icon");
    }
}
