/// Convenience result type used across twibbon.
pub type TwibbonResult<T> = Result<T, TwibbonError>;

/// Top-level error taxonomy used by editor APIs.
///
/// Every variant is recoverable within the same editing session.
#[derive(thiserror::Error, Debug)]
pub enum TwibbonError {
    /// Missing or invalid user input (no file, zero-size viewport, bad argument).
    #[error("input error: {0}")]
    Input(String),

    /// Declared upload type is not a supported raster image.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Upload had zero bytes.
    #[error("input error: uploaded file is empty")]
    EmptyFile,

    /// Image bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Frame fetch failed.
    #[error("network error: {0}")]
    Network(String),

    /// Campaign lookup found nothing for the requested slug.
    #[error("not found: {0}")]
    NotFound(String),

    /// Export was requested without a photo layer.
    #[error("export error: composition has no photo layer")]
    EmptyComposition,

    /// Export failed for a reason other than a missing photo.
    #[error("export error: {0}")]
    Export(String),

    /// Invalid campaign or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TwibbonError {
    /// Build a [`TwibbonError::Input`] value.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Build a [`TwibbonError::UnsupportedFormat`] value.
    pub fn unsupported_format(mime: impl Into<String>) -> Self {
        Self::UnsupportedFormat(mime.into())
    }

    /// Build a [`TwibbonError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`TwibbonError::Network`] value.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Build a [`TwibbonError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`TwibbonError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`TwibbonError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TwibbonError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for errors caused by what the user supplied (re-prompt instead of reporting).
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::Input(_) | Self::UnsupportedFormat(_) | Self::EmptyFile
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
