//! Error types for the segmenter.
//!
//! Only configuration and I/O problems surface to callers. Failures inside a
//! segmentation pass are reported as `Segmentation` internally and answered
//! with a fallback at the public entry points.

use thiserror::Error;

/// Main error type for the segmenter library.
#[derive(Debug, Error)]
pub enum SegmenterError {
    /// A configuration value is out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A user-supplied regex pattern failed to compile.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Profile name not known to the built-in profile table.
    #[error("Unknown profile: '{0}'. Expected one of: prose, book, verse")]
    UnknownProfile(String),

    /// Internal invariant broken during a segmentation pass.
    #[error("Segmentation failed at block {}: {message}", .block.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string()))]
    Segmentation {
        message: String,
        block: Option<usize>,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing error.
    #[error("YAML parsing failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SegmenterError {
    /// Build a `Segmentation` error for the given block index.
    pub fn segmentation(message: impl Into<String>, block: Option<usize>) -> Self {
        Self::Segmentation {
            message: message.into(),
            block,
        }
    }
}

/// Result type alias for segmenter operations.
pub type Result<T> = std::result::Result<T, SegmenterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SegmenterError::UnknownProfile("drama".to_string());
        assert!(err.to_string().contains("drama"));
        assert!(err.to_string().contains("verse"));
    }

    #[test]
    fn test_segmentation_error_with_block() {
        let err = SegmenterError::segmentation("empty section stack", Some(4));
        assert_eq!(
            err.to_string(),
            "Segmentation failed at block 4: empty section stack"
        );
    }

    #[test]
    fn test_segmentation_error_without_block() {
        let err = SegmenterError::segmentation("boom", None);
        assert_eq!(err.to_string(), "Segmentation failed at block ?: boom");
    }

    #[test]
    fn test_invalid_pattern_display() {
        #[allow(clippy::invalid_regex)]
        let source = regex::Regex::new("(unclosed").unwrap_err();
        let err = SegmenterError::InvalidPattern {
            pattern: "(unclosed".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid pattern '(unclosed'"));
    }
}
