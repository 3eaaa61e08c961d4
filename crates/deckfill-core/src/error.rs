//! Error types for template population.

use std::fmt;

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, PopulateError>;

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failures reported by a document gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Document or template does not exist or is not visible
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authorized for the document
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Batch exceeded the service payload ceiling
    #[error("Payload too large: {size} bytes exceeds the {limit}-byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// An operation referenced a missing object or was malformed
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Service asked the caller to slow down
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Temporary backend or transport failure
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Response could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Gateway does not implement the call
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl GatewayError {
    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Transient(_))
    }

    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "GW001",
            Self::PermissionDenied(_) => "GW002",
            Self::PayloadTooLarge { .. } => "GW003",
            Self::InvalidOperation(_) => "GW004",
            Self::RateLimited(_) => "GW005",
            Self::Transient(_) => "GW006",
            Self::Malformed(_) => "GW007",
            Self::Unsupported(_) => "GW008",
        }
    }
}

/// Stage of a population run, used to name the failing step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Copying the template
    Copy,
    /// Filing the copy into a folder
    Move,
    /// Fetching a snapshot
    Fetch,
    /// Duplicating and deleting slides
    Structural,
    /// Inserting table rows
    Rows,
    /// Writing table cells
    Cells,
    /// Replacing scalar markers
    Scalar,
}

impl Step {
    /// Human-readable step name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Fetch => "fetch",
            Self::Structural => "structural mutation",
            Self::Rows => "row insertion",
            Self::Cells => "cell population",
            Self::Scalar => "scalar substitution",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal errors of a population run
#[derive(Error, Debug)]
pub enum PopulateError {
    /// A gateway call failed
    #[error("{step} failed: {source}")]
    Gateway {
        step: Step,
        #[source]
        source: GatewayError,
    },

    /// A batch exceeded the hard payload ceiling; nothing was sent for it
    #[error("{step} failed: batch of {size} bytes exceeds the {limit}-byte ceiling")]
    PayloadTooLarge {
        step: Step,
        size: usize,
        limit: usize,
    },

    /// The run was cancelled before a remote call
    #[error("Cancelled before {step}")]
    Cancelled { step: Step },

    /// Input data has the wrong shape
    #[error("Invalid input data: {reason}")]
    InvalidData { reason: String },

    /// Engine settings are invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PopulateError {
    /// Wrap a gateway error with the step it happened in
    pub fn gateway(step: Step, source: GatewayError) -> Self {
        Self::Gateway { step, source }
    }

    /// Create an invalid data error
    pub fn invalid_data(reason: impl Into<String>) -> Self {
        Self::InvalidData {
            reason: reason.into(),
        }
    }

    /// The step that failed, when the error is tied to one
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Gateway { step, .. }
            | Self::PayloadTooLarge { step, .. }
            | Self::Cancelled { step } => Some(*step),
            Self::InvalidData { .. } | Self::Config(_) => None,
        }
    }

    /// Get the error code for diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::Gateway { source, .. } => source.code(),
            Self::PayloadTooLarge { .. } => "DF101",
            Self::Cancelled { .. } => "DF102",
            Self::InvalidData { .. } => "DF103",
            Self::Config(_) => "DF104",
        }
    }
}

/// Invalid engine settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Pagination needs at least one data row per table
    #[error("items_per_slide must be at least 1")]
    ZeroItemsPerSlide,

    /// Chunk bound outside `1..=ceiling`
    #[error("max_batch_bytes must be between 1 and {ceiling}, got {value}")]
    BatchBytesOutOfRange { value: usize, ceiling: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(GatewayError::RateLimited("slow down".into()).is_retryable());
        assert!(GatewayError::Transient("503".into()).is_retryable());
        assert!(!GatewayError::NotFound("doc".into()).is_retryable());
        assert!(!GatewayError::PayloadTooLarge { size: 2, limit: 1 }.is_retryable());
    }

    #[test]
    fn test_error_display_names_step() {
        let err = PopulateError::gateway(
            Step::Cells,
            GatewayError::InvalidOperation("no such table".into()),
        );
        let text = err.to_string();
        assert!(text.contains("cell population"));
        assert!(text.contains("no such table"));
        assert_eq!(err.step(), Some(Step::Cells));
        assert_eq!(err.code(), "GW004");
    }

    #[test]
    fn test_payload_error_display() {
        let err = PopulateError::PayloadTooLarge {
            step: Step::Scalar,
            size: 11,
            limit: 10,
        };
        assert!(err.to_string().contains("11 bytes"));
        assert_eq!(err.code(), "DF101");
    }

    #[test]
    fn test_config_error_passthrough() {
        let err: PopulateError = ConfigError::ZeroItemsPerSlide.into();
        assert_eq!(err.to_string(), "items_per_slide must be at least 1");
        assert_eq!(err.step(), None);
    }
}
