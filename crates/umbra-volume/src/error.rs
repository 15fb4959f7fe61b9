//! Error types for the shadow pass.

use std::path::PathBuf;

/// Coarse classification of a [`ShadowError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Shapes, tile layout, light or march parameters are inconsistent.
    InvalidConfiguration,
    /// The input atlas could not be read or the output could not be written.
    IoFailure,
    /// The execution substrate failed or a task produced an unusable value.
    ComputeFailure,
}

/// Errors that abort a shadow pass. No output is published when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum ShadowError {
    /// A configuration field failed validation.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfiguration {
        /// Name of the offending configuration field.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },

    /// Failed to open or decode the input atlas.
    #[error("failed to read atlas {}: {source}", path.display())]
    AtlasRead {
        /// Path of the input atlas.
        path: PathBuf,
        /// Underlying decode or I/O error.
        #[source]
        source: image::ImageError,
    },

    /// Failed to create, write, or rename the output file.
    #[error("failed to write output {}: {source}", path.display())]
    OutputWrite {
        /// Path of the output image.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode the output image.
    #[error("failed to encode output {}: {source}", path.display())]
    OutputEncode {
        /// Path of the output image.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },

    /// The parallel substrate was unavailable or a task faulted.
    #[error("compute failure: {reason}")]
    Compute {
        /// What went wrong, including the element when known.
        reason: String,
    },
}

impl ShadowError {
    /// Shorthand for an [`ShadowError::InvalidConfiguration`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`ShadowError::Compute`].
    pub fn compute(reason: impl Into<String>) -> Self {
        Self::Compute {
            reason: reason.into(),
        }
    }

    /// The error's classification.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Self::AtlasRead { .. } | Self::OutputWrite { .. } | Self::OutputEncode { .. } => {
                ErrorKind::IoFailure
            }
            Self::Compute { .. } => ErrorKind::ComputeFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_names_field() {
        let err = ShadowError::invalid("tile_layout", "4 columns do not divide width 10");
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        let msg = err.to_string();
        assert!(msg.contains("tile_layout"), "{msg}");
        assert!(msg.contains("do not divide"), "{msg}");
    }

    #[test]
    fn test_io_errors_classified() {
        let err = ShadowError::OutputWrite {
            path: PathBuf::from("/nowhere/out.png"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().contains("/nowhere/out.png"));
    }

    #[test]
    fn test_compute_kind() {
        assert_eq!(
            ShadowError::compute("pool unavailable").kind(),
            ErrorKind::ComputeFailure
        );
    }
}
