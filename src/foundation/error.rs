/// Convenience result type used across slidecanvas.
pub type SlideResult<T> = Result<T, SlideError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Parser conditions never surface here; they are reported as
/// [`crate::ParseDiagnostic`] values. Unsupported geometry edits are reported as
/// [`crate::EditOutcome::Unsupported`].
#[derive(thiserror::Error, Debug)]
pub enum SlideError {
    /// Invalid caller-provided data or an object-model invariant violation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Source could not be read or tokenized at all.
    #[error("parse error: {0}")]
    Parse(String),

    /// Drawing-surface creation or rasterization failed.
    #[error("surface error: {0}")]
    Surface(String),

    /// PDF or PPTX generation failed.
    #[error("{format} export failed: {message}")]
    Export {
        /// Output format being generated (`pdf` or `pptx`).
        format: &'static str,
        /// Human-readable cause.
        message: String,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlideError {
    /// Build a [`SlideError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SlideError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`SlideError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Build a [`SlideError::Export`] value.
    pub fn export(format: &'static str, msg: impl Into<String>) -> Self {
        Self::Export {
            format,
            message: msg.into(),
        }
    }

    /// Build a [`SlideError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
