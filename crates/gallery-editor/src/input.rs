//! Input abstraction layer.
//!
//! Normalizes DOM mouse, keyboard, clipboard and drag events into a
//! `GalleryEvent` consumed by `BlockInstance::handle`.

use gallery_core::{Bounds, ImageRecord, Point};

/// Where a drag is hovering or dropping inside a block.
#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget {
    /// Over the image at `index`, whose bounds are `bounds`.
    Image { index: usize, bounds: Bounds },
    /// Over the block itself (empty area or past the last image). `items`
    /// are the bounds of every rendered image, left to right.
    Block { items: Vec<Bounds> },
}

/// A normalized input event for one block.
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    /// Click landing inside (`true`) or outside (`false`) the block.
    Click { inside: bool },

    /// Key press while the block is active.
    Key { key: String, caption_focused: bool },

    /// Caption text edited.
    CaptionInput { text: String },

    /// Paste into the block; `images` are records already probed by intake.
    Paste { images: Vec<ImageRecord> },

    /// Drag started on the image at `index`.
    DragStart { index: usize },

    DragOver { pointer: Point, target: DropTarget },

    DragLeave,

    /// Drop, with the raw payload read from the drag data channel.
    Drop {
        pointer: Point,
        target: DropTarget,
        transfer: Option<String>,
    },

    /// The drag gesture ended, whether or not a drop happened.
    DragEnd,
}

impl GalleryEvent {
    pub fn is_backspace(&self) -> bool {
        matches!(self, Self::Key { key, caption_focused: false } if key == "Backspace")
    }
}
