/// Convenience result type used across pagsmith.
pub type PagResult<T> = Result<T, PagError>;

/// Error taxonomy for template editing and rendering.
///
/// Per-item variants (`LayerNotEditable`, `LayerAmbiguous`, `ImageDecode`, `ImageSource`,
/// `Substitution`) are recorded in an outcome ledger and never abort a batch. Request-level
/// variants (`InputUnreadable`, `SerializationFailed`, `SdkUnavailable`) abort the operation.
#[derive(thiserror::Error, Debug)]
pub enum PagError {
    /// The input document could not be parsed.
    #[error("input unreadable: {0}")]
    InputUnreadable(String),

    /// No editable layer/text record exists at the requested index.
    #[error("layer not editable: {0}")]
    LayerNotEditable(String),

    /// Several layers share one editable index and the policy rejects ambiguity.
    #[error("layer ambiguous: {0}")]
    LayerAmbiguous(String),

    /// Image payload could not be decoded into an SDK image.
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// Image reference could not be resolved to bytes or a file.
    #[error("image source error: {0}")]
    ImageSource(String),

    /// The SDK rejected a replace call.
    #[error("substitution failed: {0}")]
    Substitution(String),

    /// Exporting the document to bytes failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// A frame could not be rasterized or read back.
    #[error("frame rasterize failed: {0}")]
    FrameRasterizeFailed(String),

    /// The document SDK did not load at startup.
    #[error("document sdk unavailable: {0}")]
    SdkUnavailable(String),

    /// Invalid user-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PagError {
    /// Build a [`PagError::InputUnreadable`] value.
    pub fn input_unreadable(msg: impl Into<String>) -> Self {
        Self::InputUnreadable(msg.into())
    }

    /// Build a [`PagError::LayerNotEditable`] value.
    pub fn layer_not_editable(msg: impl Into<String>) -> Self {
        Self::LayerNotEditable(msg.into())
    }

    /// Build a [`PagError::LayerAmbiguous`] value.
    pub fn layer_ambiguous(msg: impl Into<String>) -> Self {
        Self::LayerAmbiguous(msg.into())
    }

    /// Build a [`PagError::ImageDecode`] value.
    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Build a [`PagError::ImageSource`] value.
    pub fn image_source(msg: impl Into<String>) -> Self {
        Self::ImageSource(msg.into())
    }

    /// Build a [`PagError::Substitution`] value.
    pub fn substitution(msg: impl Into<String>) -> Self {
        Self::Substitution(msg.into())
    }

    /// Build a [`PagError::SerializationFailed`] value.
    pub fn serialization_failed(msg: impl Into<String>) -> Self {
        Self::SerializationFailed(msg.into())
    }

    /// Build a [`PagError::FrameRasterizeFailed`] value.
    pub fn frame_rasterize(msg: impl Into<String>) -> Self {
        Self::FrameRasterizeFailed(msg.into())
    }

    /// Build a [`PagError::SdkUnavailable`] value.
    pub fn sdk_unavailable(msg: impl Into<String>) -> Self {
        Self::SdkUnavailable(msg.into())
    }

    /// Build a [`PagError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PagError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error aborts the whole request rather than a single item.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InputUnreadable(_) | Self::SerializationFailed(_) | Self::SdkUnavailable(_)
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
