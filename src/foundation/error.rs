/// Convenience result type used across photoveil.
pub type PhotoveilResult<T> = Result<T, PhotoveilError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum PhotoveilError {
    /// Invalid user-provided overlay, document or configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Degenerate or non-finite geometry that cannot be resolved.
    #[error("geometry error: {0}")]
    Geometry(String),

    /// Failures while resolving, loading or decoding an asset.
    #[error("asset error: {0}")]
    Asset(String),

    /// Failures while rasterizing or compositing a surface.
    #[error("render error: {0}")]
    Render(String),

    /// Failures while serializing or delivering an exported image.
    #[error("export error: {0}")]
    Export(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhotoveilError {
    /// Build a [`PhotoveilError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PhotoveilError::Geometry`] value.
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Build a [`PhotoveilError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`PhotoveilError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PhotoveilError::Export`] value.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Build a [`PhotoveilError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
