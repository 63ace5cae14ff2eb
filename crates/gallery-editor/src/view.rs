//! Render model of a gallery block.
//!
//! `BlockView` is a plain description of what the DOM should show: class
//! names, image tiles with their widths and drop markers, and the caption
//! field. The WASM bridge turns it into elements; tests assert on it
//! directly.

use crate::block::{BlockInstance, BlockState, DropMarker};
use gallery_core::layout::{ImageWidth, image_widths};

pub const ROOT_CLASS: &str = "image-gallery";
pub const ACTIVE_CLASS: &str = "image-gallery--active";
pub const DRAGGING_CLASS: &str = "image-gallery--dragging";
pub const NOT_ALLOWED_CLASS: &str = "image-gallery--not-allowed";
pub const REJECTED_CLASS: &str = "image-gallery--rejected";
pub const READ_ONLY_CLASS: &str = "image-gallery--read-only";
pub const TAIL_MARKER_CLASS: &str = "drag-insert-here";

#[derive(Debug, Clone, PartialEq)]
pub struct BlockView {
    pub classes: Vec<String>,
    pub tiles: Vec<TileView>,
    pub caption: CaptionView,
    /// Show the "insert here" marker after the last tile.
    pub tail_marker: bool,
    /// Images may be dragged.
    pub draggable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileView {
    pub url: String,
    pub alt: String,
    pub width: ImageWidth,
    /// `drag-over-*` classes currently on this tile.
    pub markers: Vec<&'static str>,
    /// This tile is the drag source.
    pub dragging: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptionView {
    pub text: String,
    pub visible: bool,
    pub focused: bool,
    pub editable: bool,
}

impl BlockView {
    /// Whether `other` shows the same images at the same widths, so that
    /// only classes and markers differ and existing tiles can be kept.
    pub fn same_tiles(&self, other: &BlockView) -> bool {
        self.tiles.len() == other.tiles.len()
            && self
                .tiles
                .iter()
                .zip(&other.tiles)
                .all(|(a, b)| a.url == b.url && a.alt == b.alt && a.width == b.width)
    }
}

impl BlockInstance {
    pub fn view(&self) -> BlockView {
        let data = self.data();
        let state = self.state();
        let config = &self.context().config;

        let mut classes = vec![ROOT_CLASS.to_string()];
        let host_class = self.context().host.block_style_class_name();
        if !host_class.is_empty() {
            classes.push(host_class);
        }
        if state == BlockState::Active {
            classes.push(ACTIVE_CLASS.into());
        }
        if state.dragging_index().is_some() {
            classes.push(DRAGGING_CLASS.into());
        }
        if state.marker() == Some(DropMarker::NotAllowed) {
            classes.push(NOT_ALLOWED_CLASS.into());
        }
        if self.is_rejected() {
            classes.push(REJECTED_CLASS.into());
        }
        if self.is_read_only() {
            classes.push(READ_ONLY_CLASS.into());
        }

        let widths = image_widths(&data.images, config);
        let tiles = data
            .images
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (img, width))| TileView {
                url: img.url.clone(),
                alt: img.name.clone(),
                width,
                markers: match state.marker() {
                    Some(DropMarker::Zone { zone, index }) if index == i => {
                        vec![zone.marker_class()]
                    }
                    _ => Vec::new(),
                },
                dragging: state.dragging_index() == Some(i),
            })
            .collect();

        BlockView {
            classes,
            tiles,
            caption: CaptionView {
                text: data.caption.clone(),
                visible: self.caption_visible(),
                focused: state == BlockState::Active,
                editable: !self.is_read_only(),
            },
            tail_marker: state.marker() == Some(DropMarker::Tail),
            draggable: !self.is_read_only(),
        }
    }
}
