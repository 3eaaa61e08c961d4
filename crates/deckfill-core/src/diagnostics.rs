//! Non-fatal population diagnostics
//!
//! Anomalies that do not stop a run (a table bound to a key the data lacks,
//! a duplicated slide that could not be found again, a marker with no value)
//! are recorded as diagnostics and returned to the caller with the run's
//! statistics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Table marker names a key that is missing from the input data
pub const MISSING_ARRAY_KEY: &str = "DF001";
/// Resolved table count differs from the planned slide count
pub const RECONCILE_MISMATCH: &str = "DF002";
/// A second table is bound to a key that already has a plan
pub const DUPLICATE_BINDING: &str = "DF003";
/// No tables were found for a planned key after structural changes
pub const GROUP_NOT_FOUND: &str = "DF004";
/// Scalar marker without a matching data key
pub const UNRESOLVED_MARKER: &str = "DF005";
/// Several bound tables share one slide
pub const SHARED_SLIDE: &str = "DF006";

/// A diagnostic message from a population run
///
/// # Example
///
/// ```
/// use deckfill_core::diagnostics::{Diagnostic, Severity};
///
/// let diag = Diagnostic::warning("Array key 'employees' not found in data")
///     .with_code("DF001")
///     .with_key("employees");
/// assert_eq!(diag.severity, Severity::Warning);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level of the diagnostic
    pub severity: Severity,

    /// The diagnostic message
    pub message: String,

    /// Stable diagnostic code (e.g., "DF001")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Data key the diagnostic is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Additional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning, part of the template was left unpopulated
    Warning,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            code: None,
            key: None,
            help: None,
        }
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an info diagnostic
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the data key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Check the diagnostic code
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message)?,
            None => write!(f, "{}: {}", self.severity, self.message)?,
        }
        if let Some(help) = &self.help {
            write!(f, " (help: {})", help)?;
        }
        Ok(())
    }
}

/// Collected diagnostics of one run
///
/// Every recorded diagnostic is also emitted as a `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => tracing::warn!(
                code = diagnostic.code.as_deref().unwrap_or("-"),
                key = diagnostic.key.as_deref().unwrap_or("-"),
                "{}",
                diagnostic.message
            ),
            Severity::Info => tracing::info!(
                code = diagnostic.code.as_deref().unwrap_or("-"),
                key = diagnostic.key.as_deref().unwrap_or("-"),
                "{}",
                diagnostic.message
            ),
        }
        self.items.push(diagnostic);
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Recorded diagnostics in order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Count diagnostics with a given code
    pub fn count_code(&self, code: &str) -> usize {
        self.items.iter().filter(|d| d.has_code(code)).count()
    }

    /// Consume into the underlying list
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
