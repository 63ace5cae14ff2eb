//! Error taxonomy for the gallery block.
//!
//! None of these ever reach the host editor as a thrown error: each is
//! handled where it is detected (a rejected drop, a failed intake entry, a
//! logged host call).

use crate::id::BlockId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GalleryError {
    /// An image could not be decoded to measure its natural size.
    #[error("failed to load dimensions of `{name}`: {reason}")]
    DimensionLoad { name: String, reason: String },

    /// A selected or pasted file is not an image.
    #[error("`{name}` is not an image ({mime_type})")]
    UnsupportedType { name: String, mime_type: String },

    /// The drag payload at drop time was missing, malformed, or stale.
    #[error("invalid drop transfer: {0}")]
    InvalidDropTransfer(String),

    /// The target block is already full.
    #[error("block {block} already holds {capacity} images")]
    CapacityExceeded { block: BlockId, capacity: usize },

    #[error(transparent)]
    Host(#[from] HostError),
}

/// A failure reported by the host editor API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host editor: {message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for GalleryError {
    fn from(err: serde_json::Error) -> Self {
        GalleryError::InvalidDropTransfer(err.to_string())
    }
}
