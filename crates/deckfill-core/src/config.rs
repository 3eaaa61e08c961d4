//! Engine settings
//!
//! Policy values of a population run. Every field has a default, so a
//! settings file only needs the values it changes:
//!
//! ```toml
//! items_per_slide = 8
//! marker_scope = "all-rows"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Hard ceiling of one batch-update payload (10 MiB of serialized JSON)
pub const MAX_BATCH_BYTES: usize = 10 * 1024 * 1024;

/// Data rows per table instance: six table rows minus the header
pub const DEFAULT_ITEMS_PER_SLIDE: usize = 5;

/// Which table rows are scanned for the binding marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerScope {
    /// Header row only
    #[default]
    Header,
    /// Every row, top to bottom
    AllRows,
}

/// Engine policy values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Data rows per table instance
    pub items_per_slide: usize,
    /// Upper bound of one chunk's serialized size
    pub max_batch_bytes: usize,
    /// Rows scanned for table-binding markers
    pub marker_scope: MarkerScope,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            items_per_slide: DEFAULT_ITEMS_PER_SLIDE,
            max_batch_bytes: MAX_BATCH_BYTES,
            marker_scope: MarkerScope::Header,
        }
    }
}

impl EngineConfig {
    /// Set the data rows per table instance
    pub fn with_items_per_slide(mut self, items_per_slide: usize) -> Self {
        self.items_per_slide = items_per_slide;
        self
    }

    /// Set the chunk bound
    pub fn with_max_batch_bytes(mut self, max_batch_bytes: usize) -> Self {
        self.max_batch_bytes = max_batch_bytes;
        self
    }

    /// Set the marker scan scope
    pub fn with_marker_scope(mut self, scope: MarkerScope) -> Self {
        self.marker_scope = scope;
        self
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items_per_slide == 0 {
            return Err(ConfigError::ZeroItemsPerSlide);
        }
        if self.max_batch_bytes == 0 || self.max_batch_bytes > MAX_BATCH_BYTES {
            return Err(ConfigError::BatchBytesOutOfRange {
                value: self.max_batch_bytes,
                ceiling: MAX_BATCH_BYTES,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.items_per_slide, 5);
        assert_eq!(config.max_batch_bytes, 10_485_760);
        assert_eq!(config.marker_scope, MarkerScope::Header);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: EngineConfig = toml::from_str(
            r#"
items_per_slide = 8
marker_scope = "all-rows"
"#,
        )
        .unwrap();
        assert_eq!(config.items_per_slide, 8);
        assert_eq!(config.marker_scope, MarkerScope::AllRows);
        assert_eq!(config.max_batch_bytes, MAX_BATCH_BYTES);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert_eq!(
            EngineConfig::default().with_items_per_slide(0).validate(),
            Err(ConfigError::ZeroItemsPerSlide)
        );
        assert!(matches!(
            EngineConfig::default()
                .with_max_batch_bytes(MAX_BATCH_BYTES + 1)
                .validate(),
            Err(ConfigError::BatchBytesOutOfRange { .. })
        ));
        assert!(EngineConfig::default()
            .with_max_batch_bytes(0)
            .validate()
            .is_err());
    }
}
