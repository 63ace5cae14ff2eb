//! Data model for gallery blocks.
//!
//! A gallery block persists as an ordered list of image records plus a
//! caption. Records are moved between blocks by drag and drop, never
//! copied; the `TransferEnvelope` is the JSON that rides along on the
//! native drag payload while a record is in flight.

use crate::error::GalleryError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Images held by one block. Three is the normal maximum, so the list
/// stays inline.
pub type ImageList = SmallVec<[ImageRecord; 3]>;

// ─── Image records ───────────────────────────────────────────────────────

/// One uploaded image with resolved natural dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Transient handle to the image bytes (an object URL in the browser).
    pub url: String,
    pub name: String,
    pub byte_size: u64,
    pub mime_type: String,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub aspect_ratio: f64,
}

impl ImageRecord {
    /// Build a record from probed dimensions. Zero-sized images are
    /// rejected so that `aspect_ratio` is always positive.
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        byte_size: u64,
        mime_type: impl Into<String>,
        pixel_width: u32,
        pixel_height: u32,
    ) -> Result<Self, GalleryError> {
        let name = name.into();
        if pixel_width == 0 || pixel_height == 0 {
            return Err(GalleryError::DimensionLoad {
                name,
                reason: format!("degenerate size {pixel_width}x{pixel_height}"),
            });
        }
        Ok(Self {
            url: url.into(),
            name,
            byte_size,
            mime_type: mime_type.into(),
            pixel_width,
            pixel_height,
            aspect_ratio: pixel_width as f64 / pixel_height as f64,
        })
    }

    /// Two records refer to the same image when they share a handle.
    pub fn same_image(&self, other: &ImageRecord) -> bool {
        self.url == other.url
    }
}

// ─── Block data ──────────────────────────────────────────────────────────

/// Persisted state of one gallery block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockData {
    /// Left-to-right render order.
    pub images: ImageList,
    pub caption: String,
}

impl BlockData {
    pub fn with_images(images: impl IntoIterator<Item = ImageRecord>) -> Self {
        Self {
            images: images.into_iter().collect(),
            caption: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn is_full(&self, capacity: usize) -> bool {
        self.images.len() >= capacity
    }

    /// Sum of aspect ratios, the denominator of every width share.
    pub fn total_aspect_ratio(&self) -> f64 {
        self.images.iter().map(|img| img.aspect_ratio).sum()
    }

    /// Remove the record at `index`, but only if it is still `expected`.
    /// A mismatch means the caller's view of the list is stale.
    pub fn take_image(&mut self, index: usize, expected: &ImageRecord) -> Option<ImageRecord> {
        match self.images.get(index) {
            Some(img) if img.same_image(expected) => Some(self.images.remove(index)),
            _ => None,
        }
    }

    /// Insert at `index`, clamped to the end of the list.
    pub fn insert_image(&mut self, index: usize, image: ImageRecord) -> usize {
        let at = index.min(self.images.len());
        self.images.insert(at, image);
        at
    }

    /// Move the image at `from` to insertion point `to`, where `to` is
    /// expressed against the list *before* removal (0..=len). Returns
    /// `false` when the move would leave the order unchanged.
    pub fn move_image(&mut self, from: usize, to: usize) -> bool {
        let len = self.images.len();
        if from >= len || to > len || to == from || to == from + 1 {
            return false;
        }
        let image = self.images.remove(from);
        let at = if to > from { to - 1 } else { to };
        self.images.insert(at, image);
        true
    }

    /// Drop every image, returning them so their handles can be released.
    pub fn clear_images(&mut self) -> ImageList {
        std::mem::take(&mut self.images)
    }
}

// ─── Drag payload ────────────────────────────────────────────────────────

/// JSON envelope carried on the native drag payload channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEnvelope {
    pub image_data: ImageRecord,
    pub source_index: usize,
    pub block_index: usize,
}

impl TransferEnvelope {
    /// MIME type used for the payload on the drag data channel.
    pub const MIME: &'static str = "application/json";

    pub fn to_json(&self) -> Result<String, GalleryError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a payload read at drop time. Absent or malformed payloads are
    /// an `InvalidDropTransfer`.
    pub fn from_json(raw: Option<&str>) -> Result<Self, GalleryError> {
        let raw = raw
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| GalleryError::InvalidDropTransfer("empty drag payload".into()))?;
        Ok(serde_json::from_str(raw)?)
    }
}

// ─── Geometry primitives ─────────────────────────────────────────────────

/// Pointer position in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An element's bounding client rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}
