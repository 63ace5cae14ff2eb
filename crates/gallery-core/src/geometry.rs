//! Drop-zone geometry: pointer position → drop classification and
//! insertion index.

use crate::model::{Bounds, Point};
use serde::{Deserialize, Serialize};

/// The directional region of a drop target the pointer is over.
///
/// `Top`/`Bottom` mean "split into a new block above/below";
/// `Left`/`Right` mean "place beside this image".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropZone {
    Top,
    Bottom,
    Left,
    Right,
}

impl DropZone {
    pub fn is_vertical(self) -> bool {
        matches!(self, DropZone::Top | DropZone::Bottom)
    }

    /// CSS marker class shown on the hovered image.
    pub fn marker_class(self) -> &'static str {
        match self {
            DropZone::Top => "drag-over-top",
            DropZone::Bottom => "drag-over-bottom",
            DropZone::Left => "drag-over-left",
            DropZone::Right => "drag-over-right",
        }
    }
}

/// Classify the pointer against the target's centre.
///
/// The axis with the larger absolute offset wins. Equal magnitudes go to the
/// vertical axis, and a zero offset counts as positive, so the exact centre
/// is `Bottom`.
pub fn classify_drop_zone(pointer: Point, target: Bounds) -> DropZone {
    let center = target.center();
    let dx = pointer.x - center.x;
    let dy = pointer.y - center.y;

    if dy.abs() >= dx.abs() {
        if dy < 0.0 {
            DropZone::Top
        } else {
            DropZone::Bottom
        }
    } else if dx < 0.0 {
        DropZone::Left
    } else {
        DropZone::Right
    }
}

/// Insertion index relative to a single hovered image at `target_index`.
pub fn insertion_index_from_pointer(pointer: Point, target: Bounds, target_index: usize) -> usize {
    if pointer.x < target.center().x {
        target_index
    } else {
        target_index + 1
    }
}

/// Insertion index from every item's bounds, scanned left to right: the
/// first item whose centre is right of the pointer, or the end.
pub fn insertion_index_from_item_list(pointer: Point, items: &[Bounds]) -> usize {
    items
        .iter()
        .position(|b| b.center().x > pointer.x)
        .unwrap_or(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: Bounds = Bounds::new(100.0, 100.0, 200.0, 100.0);

    #[test]
    fn clear_directions() {
        // centre is (200, 150)
        assert_eq!(classify_drop_zone(Point::new(200.0, 105.0), TILE), DropZone::Top);
        assert_eq!(classify_drop_zone(Point::new(200.0, 195.0), TILE), DropZone::Bottom);
        assert_eq!(classify_drop_zone(Point::new(110.0, 150.0), TILE), DropZone::Left);
        assert_eq!(classify_drop_zone(Point::new(290.0, 150.0), TILE), DropZone::Right);
    }

    #[test]
    fn ties_resolve_to_vertical_axis() {
        assert_eq!(classify_drop_zone(Point::new(200.0, 150.0), TILE), DropZone::Bottom);
        assert_eq!(classify_drop_zone(Point::new(230.0, 120.0), TILE), DropZone::Top);
        assert_eq!(classify_drop_zone(Point::new(170.0, 180.0), TILE), DropZone::Bottom);
    }

    #[test]
    fn pointer_index_splits_on_horizontal_centre() {
        assert_eq!(insertion_index_from_pointer(Point::new(150.0, 0.0), TILE, 2), 2);
        assert_eq!(insertion_index_from_pointer(Point::new(200.0, 0.0), TILE, 2), 3);
        assert_eq!(insertion_index_from_pointer(Point::new(250.0, 0.0), TILE, 2), 3);
    }

    #[test]
    fn item_list_index() {
        let items = [
            Bounds::new(0.0, 0.0, 100.0, 50.0),
            Bounds::new(100.0, 0.0, 100.0, 50.0),
            Bounds::new(200.0, 0.0, 100.0, 50.0),
        ];
        assert_eq!(insertion_index_from_item_list(Point::new(10.0, 0.0), &items), 0);
        assert_eq!(insertion_index_from_item_list(Point::new(120.0, 0.0), &items), 1);
        assert_eq!(insertion_index_from_item_list(Point::new(260.0, 0.0), &items), 3);
        assert_eq!(insertion_index_from_item_list(Point::new(0.0, 0.0), &[]), 0);
    }

    #[test]
    fn markers_match_zone() {
        assert_eq!(DropZone::Left.marker_class(), "drag-over-left");
        assert!(DropZone::Top.is_vertical());
        assert!(!DropZone::Right.is_vertical());
    }
}
