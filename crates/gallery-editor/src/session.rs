//! The drag session shared by every gallery block of one editor.
//!
//! Origin and target of a cross-block drag are independent instances with
//! no other channel between them, so the in-flight image lives here from
//! drag-start until drop or drag-end. Instances hold an `Rc<DragSession>`
//! and can only move it through `begin`, `take` and `end`.

use crate::block::{BlockInstance, SharedBlock};
use gallery_core::{BlockId, ImageRecord};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Everything known about the image being dragged. Present as a whole or
/// not at all.
#[derive(Debug, Clone)]
pub struct DragPayload {
    pub image: ImageRecord,
    pub origin_id: BlockId,
    pub origin_index: usize,
    origin: Weak<RefCell<BlockInstance>>,
}

impl DragPayload {
    /// The origin instance, if it is still alive.
    pub fn origin(&self) -> Option<SharedBlock> {
        self.origin.upgrade()
    }

    pub fn is_from(&self, block: &SharedBlock) -> bool {
        std::ptr::eq(self.origin.as_ptr(), Rc::as_ptr(block))
    }
}

#[derive(Debug, Default)]
pub struct DragSession {
    payload: RefCell<Option<DragPayload>>,
}

impl DragSession {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Start a drag. A payload left over from a drag that never finished is
    /// replaced.
    pub fn begin(&self, origin: &SharedBlock, origin_id: BlockId, index: usize, image: ImageRecord) {
        let stale = self.payload.replace(Some(DragPayload {
            image,
            origin_id,
            origin_index: index,
            origin: Rc::downgrade(origin),
        }));
        if let Some(stale) = stale {
            log::warn!(
                "drag from {} replaced an unfinished drag from {}",
                origin_id,
                stale.origin_id
            );
        }
        log::trace!("drag begin: {origin_id}[{index}]");
    }

    pub fn current(&self) -> Option<DragPayload> {
        self.payload.borrow().clone()
    }

    pub fn is_active(&self) -> bool {
        self.payload.borrow().is_some()
    }

    pub fn origin_id(&self) -> Option<BlockId> {
        self.payload.borrow().as_ref().map(|p| p.origin_id)
    }

    /// Remove and return the payload, leaving the session empty.
    pub fn take(&self) -> Option<DragPayload> {
        self.payload.borrow_mut().take()
    }

    /// Clear the session. Safe to call when nothing is in flight.
    pub fn end(&self) {
        if self.take().is_some() {
            log::trace!("drag session cleared");
        }
    }
}
