/// Convenience result type used across the renderer.
pub type ScreenResult<T> = Result<T, ScreenError>;

/// Top-level error taxonomy used by renderer APIs.
///
/// A render either produces a complete image or returns one of these; there is no partial
/// output.
#[derive(thiserror::Error, Debug)]
pub enum ScreenError {
    /// A template texture or layer image could not be fetched or decoded.
    #[error("asset load error: '{key}': {reason}")]
    AssetLoad {
        /// Logical key or reference of the asset that failed.
        key: String,
        /// Human readable cause.
        reason: String,
    },

    /// Missing or malformed configuration (text properties, fonts, options).
    #[error("config error: {0}")]
    Config(String),

    /// Invalid numeric or structural input that has no safe default.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure while serializing the finished surface.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScreenError {
    /// Build a [`ScreenError::AssetLoad`] value.
    pub fn asset_load(key: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::AssetLoad {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`ScreenError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ScreenError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ScreenError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
