//! Gallery block instances and the drag-and-drop protocol.
//!
//! One `BlockInstance` exists per rendered gallery block. It owns the
//! block's images and caption; the host keeps a persisted copy that is
//! re-synchronized through `HostCommand::Update` after every mutation.
//!
//! A drag that crosses blocks touches two instances: the origin publishes
//! itself into the shared `DragSession` on drag-start, and the instance
//! that receives the drop reads it back and edits both lists. Host
//! requests are planned while the instances are borrowed and applied only
//! after the borrows are released.

use crate::host::{HostCommand, HostEditor, apply_commands};
use crate::input::{DropTarget, GalleryEvent};
use crate::intake::{ImageHandles, IntakeReport, KeepHandles, place_buckets};
use crate::session::{DragPayload, DragSession};
use gallery_core::geometry::{
    classify_drop_zone, insertion_index_from_item_list, insertion_index_from_pointer,
};
use gallery_core::{
    BlockData, BlockId, DropZone, GalleryConfig, GalleryError, HostError, ImageRecord, Point,
    TransferEnvelope,
};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedBlock = Rc<RefCell<BlockInstance>>;

/// Collaborators shared by every gallery block of one editor.
#[derive(Clone)]
pub struct BlockContext {
    pub host: Rc<dyn HostEditor>,
    pub session: Rc<DragSession>,
    pub handles: Rc<dyn ImageHandles>,
    pub config: Rc<GalleryConfig>,
}

impl BlockContext {
    pub fn new(host: Rc<dyn HostEditor>) -> Self {
        Self {
            host,
            session: DragSession::new(),
            handles: Rc::new(KeepHandles),
            config: Rc::new(GalleryConfig::default()),
        }
    }

    pub fn with_session(mut self, session: Rc<DragSession>) -> Self {
        self.session = session;
        self
    }

    pub fn with_handles(mut self, handles: Rc<dyn ImageHandles>) -> Self {
        self.handles = handles;
        self
    }

    pub fn with_config(mut self, config: GalleryConfig) -> Self {
        self.config = Rc::new(config);
        self
    }
}

/// Interaction state of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockState {
    #[default]
    Idle,
    /// Clicked: caption shown and focused, Backspace deletes the block.
    Active,
    /// One of this block's images is being dragged.
    Dragging { index: usize },
    /// A drag is hovering over this block. `dragging` is the source tile
    /// when the drag started here.
    DropTarget {
        marker: DropMarker,
        dragging: Option<usize>,
    },
}

impl BlockState {
    /// Index of this block's image being dragged, if any.
    pub fn dragging_index(self) -> Option<usize> {
        match self {
            BlockState::Dragging { index } => Some(index),
            BlockState::DropTarget { dragging, .. } => dragging,
            _ => None,
        }
    }

    pub fn marker(self) -> Option<DropMarker> {
        match self {
            BlockState::DropTarget { marker, .. } => Some(marker),
            _ => None,
        }
    }
}

/// What a hovering drag would do here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropMarker {
    /// Over the image at `index`, in `zone`.
    Zone { zone: DropZone, index: usize },
    /// Past the last image, or into an empty block.
    Tail,
    /// The block is full; a drop would be refused.
    NotAllowed,
}

/// Result of a drop.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// Image moved inside one block; `to` is its final index.
    Reordered { block: BlockId, from: usize, to: usize },
    /// Image moved into another block at `index`.
    Moved {
        from: BlockId,
        to: BlockId,
        index: usize,
        origin_deleted: bool,
    },
    /// Image split out into a new block above or below `target`.
    Split {
        origin: BlockId,
        target: BlockId,
        zone: DropZone,
        new_block: Option<BlockId>,
        origin_deleted: bool,
    },
    /// Dropped where it already was.
    Ignored,
    Rejected(GalleryError),
}

impl DropOutcome {
    /// Blocks whose data changed and still exist.
    pub fn affected_blocks(&self) -> SmallVec<[BlockId; 2]> {
        let mut out = SmallVec::new();
        match self {
            DropOutcome::Reordered { block, .. } => out.push(*block),
            DropOutcome::Moved {
                from,
                to,
                origin_deleted,
                ..
            } => {
                if !origin_deleted {
                    out.push(*from);
                }
                out.push(*to);
            }
            DropOutcome::Split {
                origin,
                origin_deleted,
                ..
            } if !origin_deleted => out.push(*origin),
            _ => {}
        }
        out
    }

    pub fn is_applied(&self) -> bool {
        !matches!(self, DropOutcome::Ignored | DropOutcome::Rejected(_))
    }
}

/// What the view layer should do after an event.
#[derive(Debug, Default)]
pub struct Reaction {
    /// Re-render this block.
    pub rerender: bool,
    /// Other blocks that need a re-render.
    pub others: SmallVec<[BlockId; 2]>,
    /// Payload to place on the drag data channel.
    pub transfer: Option<String>,
    pub drop: Option<DropOutcome>,
    /// The block removed itself from the host.
    pub deleted: bool,
    pub focus_caption: bool,
}

type Plan = (DropOutcome, Vec<HostCommand>);

pub struct BlockInstance {
    id: BlockId,
    data: BlockData,
    state: BlockState,
    /// The last drop onto this block was refused for capacity.
    rejected: bool,
    read_only: bool,
    ctx: BlockContext,
}

impl std::fmt::Debug for BlockInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockInstance")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("state", &self.state)
            .field("rejected", &self.rejected)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl BlockInstance {
    /// Create an instance; `None` data starts an empty gallery.
    pub fn new(id: BlockId, data: Option<BlockData>, ctx: BlockContext) -> Self {
        Self {
            id,
            data: data.unwrap_or_default(),
            state: BlockState::Idle,
            rejected: false,
            read_only: false,
            ctx,
        }
    }

    pub fn shared(id: BlockId, data: Option<BlockData>, ctx: BlockContext) -> SharedBlock {
        Rc::new(RefCell::new(Self::new(id, data, ctx)))
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn data(&self) -> &BlockData {
        &self.data
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn context(&self) -> &BlockContext {
        &self.ctx
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        if read_only {
            self.state = BlockState::Idle;
        }
    }

    /// Current data, verbatim, for persistence.
    pub fn save(&self) -> BlockData {
        self.data.clone()
    }

    pub fn caption_visible(&self) -> bool {
        self.state == BlockState::Active || !self.data.caption.is_empty()
    }

    pub fn set_caption(&mut self, text: impl Into<String>) {
        self.data.caption = text.into();
    }

    /// Enter or leave `Active`. Returns whether the state changed.
    pub fn set_active(&mut self, active: bool) -> bool {
        let next = match (active, self.state) {
            (true, _) if self.read_only => return false,
            (true, BlockState::Idle) => BlockState::Active,
            (false, BlockState::Active) => BlockState::Idle,
            _ => return false,
        };
        self.state = next;
        true
    }

    /// Paste handling. Pasted images replace the block's content, capped at
    /// the block capacity; a paste without images resets the block.
    /// Handles of images that leave the block are released.
    pub fn on_paste(&mut self, images: Vec<ImageRecord>) {
        let capacity = self.ctx.config.max_images_per_block;
        let mut incoming = images;
        let overflow = if incoming.len() > capacity {
            incoming.split_off(capacity)
        } else {
            Vec::new()
        };

        let previous = self.data.clear_images();
        for old in previous
            .iter()
            .filter(|old| !incoming.iter().any(|new| new.same_image(old)))
        {
            self.ctx.handles.release(&old.url);
        }
        for extra in &overflow {
            log::warn!("pasted image {} dropped, block is full", extra.name);
            self.ctx.handles.release(&extra.url);
        }

        self.data = BlockData::with_images(incoming);
        self.state = BlockState::Idle;
        self.rejected = false;
    }

    /// The host removed this block. Its remaining images leave every list.
    pub fn on_removed(&mut self) {
        if self.ctx.session.origin_id() == Some(self.id) {
            self.ctx.session.end();
        }
        for image in self.data.clear_images() {
            self.ctx.handles.release(&image.url);
        }
    }

    fn host_index(&self) -> Option<usize> {
        self.ctx.host.block_index(self.id)
    }

    // ─── Event dispatch ──────────────────────────────────────────────────

    pub fn handle(this: &SharedBlock, event: GalleryEvent) -> Reaction {
        let mut reaction = Reaction::default();
        match event {
            GalleryEvent::Click { inside } => {
                reaction.rerender = this.borrow_mut().set_active(inside);
                reaction.focus_caption = inside && reaction.rerender;
            }
            ref key @ GalleryEvent::Key { .. } => {
                if key.is_backspace() && this.borrow().state == BlockState::Active {
                    reaction.deleted = Self::delete_from_host(this);
                }
            }
            GalleryEvent::CaptionInput { text } => this.borrow_mut().set_caption(text),
            GalleryEvent::Paste { images } => {
                this.borrow_mut().on_paste(images);
                reaction.rerender = true;
            }
            GalleryEvent::DragStart { index } => match Self::drag_start(this, index) {
                Ok(envelope) => {
                    reaction.transfer = envelope.to_json().ok();
                    reaction.rerender = true;
                }
                Err(err) => log::warn!("drag not started: {err}"),
            },
            GalleryEvent::DragOver { pointer, target } => {
                let before = this.borrow().state;
                reaction.rerender = Self::drag_over(this, pointer, &target).is_some()
                    && this.borrow().state != before;
            }
            GalleryEvent::DragLeave => reaction.rerender = this.borrow_mut().drag_leave(),
            GalleryEvent::Drop {
                pointer,
                target,
                transfer,
            } => {
                let outcome = Self::drop(this, pointer, &target, transfer.as_deref());
                let me = this.borrow().id;
                reaction.others = outcome
                    .affected_blocks()
                    .into_iter()
                    .filter(|id| *id != me)
                    .collect();
                reaction.drop = Some(outcome);
                reaction.rerender = true;
            }
            GalleryEvent::DragEnd => {
                Self::drag_end(this);
                reaction.rerender = true;
            }
        }
        reaction
    }

    /// Backspace outside the caption: remove the whole block from the host.
    fn delete_from_host(this: &SharedBlock) -> bool {
        let (host, index) = {
            let mut me = this.borrow_mut();
            let Some(index) = me.host_index() else {
                log::warn!("block {} is not in the host", me.id);
                return false;
            };
            for image in me.data.clear_images() {
                me.ctx.handles.release(&image.url);
            }
            me.state = BlockState::Idle;
            (me.ctx.host.clone(), index)
        };
        match host.delete_block(Some(index)) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    // ─── Drag source ─────────────────────────────────────────────────────

    /// Begin dragging the image at `index` and return the payload for the
    /// drag data channel.
    pub fn drag_start(this: &SharedBlock, index: usize) -> Result<TransferEnvelope, GalleryError> {
        let mut me = this.borrow_mut();
        if me.read_only {
            return Err(GalleryError::InvalidDropTransfer("block is read-only".into()));
        }
        let image = me.data.images.get(index).cloned().ok_or_else(|| {
            GalleryError::InvalidDropTransfer(format!("no image at index {index}"))
        })?;
        let block_index = me
            .host_index()
            .unwrap_or_else(|| me.ctx.host.current_block_index());

        me.state = BlockState::Dragging { index };
        me.rejected = false;
        me.ctx.session.begin(this, me.id, index, image.clone());

        Ok(TransferEnvelope {
            image_data: image,
            source_index: index,
            block_index,
        })
    }

    /// Drag gesture finished, dropped or not. Always clears the session.
    pub fn drag_end(this: &SharedBlock) {
        let mut me = this.borrow_mut();
        me.ctx.session.end();
        if matches!(me.state, BlockState::Dragging { .. } | BlockState::DropTarget { .. }) {
            me.state = BlockState::Idle;
        }
    }

    // ─── Drop target ─────────────────────────────────────────────────────

    /// Update hover markers. Returns `None` when no drag is in flight.
    pub fn drag_over(this: &SharedBlock, pointer: Point, target: &DropTarget) -> Option<DropMarker> {
        let payload = this.borrow().ctx.session.current()?;
        let foreign = !payload.is_from(this);

        let mut me = this.borrow_mut();
        if me.read_only {
            return None;
        }
        let full = me.data.is_full(me.ctx.config.max_images_per_block);
        let marker = match target {
            DropTarget::Image { index, bounds } => {
                let zone = classify_drop_zone(pointer, *bounds);
                if foreign && full && !zone.is_vertical() {
                    DropMarker::NotAllowed
                } else {
                    DropMarker::Zone {
                        zone,
                        index: *index,
                    }
                }
            }
            DropTarget::Block { .. } if foreign && full => DropMarker::NotAllowed,
            DropTarget::Block { items } => {
                let index = insertion_index_from_item_list(pointer, items);
                if index >= me.data.len() {
                    DropMarker::Tail
                } else {
                    DropMarker::Zone {
                        zone: DropZone::Left,
                        index,
                    }
                }
            }
        };
        log::trace!("dragover {}: {marker:?}", me.id);
        me.state = BlockState::DropTarget {
            marker,
            dragging: me.state.dragging_index(),
        };
        Some(marker)
    }

    /// Pointer left the block: drop every marker.
    pub fn drag_leave(&mut self) -> bool {
        let BlockState::DropTarget { dragging, .. } = self.state else {
            return false;
        };
        self.state = match dragging {
            Some(index) => BlockState::Dragging { index },
            None => BlockState::Idle,
        };
        true
    }

    /// Resolve a drop onto this block.
    pub fn drop(
        this: &SharedBlock,
        pointer: Point,
        target: &DropTarget,
        transfer: Option<&str>,
    ) -> DropOutcome {
        let ctx = this.borrow().ctx.clone();
        let payload = ctx.session.current();

        let planned = match &payload {
            Some(payload) if !this.borrow().read_only => {
                Self::plan_drop(this, payload, pointer, target, transfer, &ctx)
            }
            Some(_) => Ok((DropOutcome::Ignored, Vec::new())),
            None => Err(GalleryError::InvalidDropTransfer(
                "no drag in progress".into(),
            )),
        };

        this.borrow_mut().state = BlockState::Idle;
        if let Some(origin) = payload.as_ref().and_then(DragPayload::origin)
            && !Rc::ptr_eq(&origin, this)
        {
            origin.borrow_mut().state = BlockState::Idle;
        }
        ctx.session.end();

        let outcome = match planned {
            Ok((mut outcome, commands)) => {
                let inserted = apply_commands(&*ctx.host, &ctx.config.block_kind, commands);
                if let DropOutcome::Split { new_block, .. } = &mut outcome {
                    *new_block = inserted.first().copied();
                }
                log::debug!("drop: {outcome:?}");
                outcome
            }
            Err(err) => {
                log::warn!("drop refused: {err}");
                DropOutcome::Rejected(err)
            }
        };

        this.borrow_mut().rejected = matches!(
            outcome,
            DropOutcome::Rejected(GalleryError::CapacityExceeded { .. })
        );
        outcome
    }

    fn plan_drop(
        this: &SharedBlock,
        payload: &DragPayload,
        pointer: Point,
        target: &DropTarget,
        transfer: Option<&str>,
        ctx: &BlockContext,
    ) -> Result<Plan, GalleryError> {
        let envelope = TransferEnvelope::from_json(transfer)?;
        if envelope.source_index != payload.origin_index
            || !envelope.image_data.same_image(&payload.image)
        {
            return Err(GalleryError::InvalidDropTransfer(
                "payload does not match the drag in progress".into(),
            ));
        }
        let origin = payload
            .origin()
            .ok_or_else(|| GalleryError::InvalidDropTransfer("origin block is gone".into()))?;

        let (zone, insert_at) = match target {
            DropTarget::Image { index, bounds } => (
                classify_drop_zone(pointer, *bounds),
                insertion_index_from_pointer(pointer, *bounds, *index),
            ),
            DropTarget::Block { items } => {
                (DropZone::Right, insertion_index_from_item_list(pointer, items))
            }
        };

        if zone.is_vertical() {
            Self::plan_split(this, &origin, payload, zone, ctx)
        } else if Rc::ptr_eq(&origin, this) {
            Self::plan_reorder(this, payload, insert_at)
        } else {
            Self::plan_move(this, &origin, payload, insert_at, ctx)
        }
    }

    /// Top/bottom: pull the image out into a new block beside the target.
    fn plan_split(
        this: &SharedBlock,
        origin: &SharedBlock,
        payload: &DragPayload,
        zone: DropZone,
        ctx: &BlockContext,
    ) -> Result<Plan, GalleryError> {
        let host = &*ctx.host;
        let target_id = this.borrow().id;
        let target_index = host
            .block_index(target_id)
            .ok_or_else(|| HostError::new(format!("no block {target_id}")))?;
        let origin_index = host
            .block_index(payload.origin_id)
            .ok_or_else(|| HostError::new(format!("no block {}", payload.origin_id)))?;

        if origin.borrow().data.len() == 1 {
            let unchanged = origin_index == target_index
                || (zone == DropZone::Top && target_index == origin_index + 1)
                || (zone == DropZone::Bottom && origin_index == target_index + 1);
            if unchanged {
                return Ok((DropOutcome::Ignored, Vec::new()));
            }
        }

        let image = take_dragged(origin, payload)?;
        let insert_at = match zone {
            DropZone::Top => target_index,
            _ => target_index + 1,
        };

        let origin_data = origin.borrow().data.clone();
        let origin_deleted = origin_data.is_empty();
        let mut commands = Vec::with_capacity(2);
        if !origin_deleted {
            commands.push(HostCommand::Update {
                id: payload.origin_id,
                data: origin_data,
            });
        }
        commands.push(HostCommand::Insert {
            data: BlockData::with_images([image]),
            index: insert_at,
        });
        if origin_deleted {
            let index = if origin_index >= insert_at {
                origin_index + 1
            } else {
                origin_index
            };
            commands.push(HostCommand::Delete { index });
        }

        Ok((
            DropOutcome::Split {
                origin: payload.origin_id,
                target: target_id,
                zone,
                new_block: None,
                origin_deleted,
            },
            commands,
        ))
    }

    /// Left/right inside the origin block.
    fn plan_reorder(
        this: &SharedBlock,
        payload: &DragPayload,
        insert_at: usize,
    ) -> Result<Plan, GalleryError> {
        let mut me = this.borrow_mut();
        let from = payload.origin_index;
        if !me
            .data
            .images
            .get(from)
            .is_some_and(|img| img.same_image(&payload.image))
        {
            return Err(GalleryError::InvalidDropTransfer(
                "dragged image is no longer at its origin index".into(),
            ));
        }
        if !me.data.move_image(from, insert_at) {
            return Ok((DropOutcome::Ignored, Vec::new()));
        }
        let to = if insert_at > from { insert_at - 1 } else { insert_at };
        Ok((
            DropOutcome::Reordered {
                block: me.id,
                from,
                to,
            },
            vec![HostCommand::Update {
                id: me.id,
                data: me.data.clone(),
            }],
        ))
    }

    /// Left/right into a different block.
    fn plan_move(
        this: &SharedBlock,
        origin: &SharedBlock,
        payload: &DragPayload,
        insert_at: usize,
        ctx: &BlockContext,
    ) -> Result<Plan, GalleryError> {
        let capacity = ctx.config.max_images_per_block;
        let target_id = this.borrow().id;
        if this.borrow().data.is_full(capacity) {
            return Err(GalleryError::CapacityExceeded {
                block: target_id,
                capacity,
            });
        }
        let origin_index = ctx.host.block_index(payload.origin_id);

        let image = take_dragged(origin, payload)?;
        let index = this.borrow_mut().data.insert_image(insert_at, image);

        let origin_data = origin.borrow().data.clone();
        let origin_deleted = origin_data.is_empty();
        let mut commands = Vec::with_capacity(2);
        if !origin_deleted {
            commands.push(HostCommand::Update {
                id: payload.origin_id,
                data: origin_data,
            });
        }
        commands.push(HostCommand::Update {
            id: target_id,
            data: this.borrow().data.clone(),
        });
        if origin_deleted {
            match origin_index {
                Some(index) => commands.push(HostCommand::Delete { index }),
                None => log::warn!("emptied block {} is not in the host", payload.origin_id),
            }
        }

        Ok((
            DropOutcome::Moved {
                from: payload.origin_id,
                to: target_id,
                index,
                origin_deleted,
            },
            commands,
        ))
    }

    // ─── Uploads ─────────────────────────────────────────────────────────

    /// Place an intake batch as new blocks after this one. The block was
    /// only a toolbox placeholder if it is still empty, so it is removed.
    pub fn accept_upload(this: &SharedBlock, report: IntakeReport) -> Vec<BlockId> {
        let (ctx, index, placeholder) = {
            let me = this.borrow();
            (me.ctx.clone(), me.host_index(), me.data.is_empty())
        };
        for failure in &report.failures {
            log::warn!("upload skipped: {failure}");
        }
        if report.records.is_empty() {
            return Vec::new();
        }

        let created = place_buckets(
            &*ctx.host,
            &ctx.config,
            report.records,
            index.map(|i| i + 1),
        );
        if placeholder
            && !created.is_empty()
            && let Some(index) = index
            && let Err(err) = ctx.host.delete_block(Some(index))
        {
            log::warn!("{err}");
        }
        created
    }
}

/// Remove the dragged record from its origin, checking it is still there.
fn take_dragged(origin: &SharedBlock, payload: &DragPayload) -> Result<ImageRecord, GalleryError> {
    origin
        .borrow_mut()
        .data
        .take_image(payload.origin_index, &payload.image)
        .ok_or_else(|| {
            GalleryError::InvalidDropTransfer(
                "dragged image is no longer at its origin index".into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use gallery_core::Bounds;

    fn img(name: &str) -> ImageRecord {
        ImageRecord::new(format!("blob:{name}"), name, 1, "image/png", 300, 200).unwrap()
    }

    fn setup(images: &[&str]) -> (Rc<MemoryHost>, SharedBlock) {
        let host = Rc::new(MemoryHost::new());
        let data = BlockData::with_images(images.iter().map(|n| img(n)));
        let id = host.push("gallery", data.clone());
        let block = BlockInstance::shared(id, Some(data), BlockContext::new(host.clone()));
        (host, block)
    }

    #[test]
    fn missing_data_defaults_to_empty() {
        let host = Rc::new(MemoryHost::new());
        let block = BlockInstance::new(BlockId::generate(), None, BlockContext::new(host));
        assert_eq!(block.save(), BlockData::default());
    }

    #[test]
    fn click_cycle_controls_caption_visibility() {
        let (_host, block) = setup(&["a"]);
        assert!(!block.borrow().caption_visible());

        let r = BlockInstance::handle(&block, GalleryEvent::Click { inside: true });
        assert!(r.rerender && r.focus_caption);
        assert_eq!(block.borrow().state(), BlockState::Active);
        assert!(block.borrow().caption_visible());

        BlockInstance::handle(&block, GalleryEvent::Click { inside: false });
        assert_eq!(block.borrow().state(), BlockState::Idle);
        assert!(!block.borrow().caption_visible());

        block.borrow_mut().set_caption("kept");
        assert!(block.borrow().caption_visible());
    }

    #[test]
    fn drag_start_leaves_active_and_publishes_session() {
        let (_host, block) = setup(&["a", "b"]);
        BlockInstance::handle(&block, GalleryEvent::Click { inside: true });

        let r = BlockInstance::handle(&block, GalleryEvent::DragStart { index: 1 });
        let payload = r.transfer.expect("transfer payload");
        let env = TransferEnvelope::from_json(Some(&payload)).unwrap();
        assert_eq!(env.source_index, 1);
        assert_eq!(env.block_index, 0);
        assert_eq!(env.image_data.name, "b");

        assert_eq!(block.borrow().state(), BlockState::Dragging { index: 1 });
        let session = block.borrow().context().session.clone();
        assert_eq!(session.current().unwrap().origin_index, 1);
    }

    #[test]
    fn drag_end_without_drop_clears_session() {
        let (_host, block) = setup(&["a"]);
        BlockInstance::handle(&block, GalleryEvent::DragStart { index: 0 });
        BlockInstance::handle(&block, GalleryEvent::DragEnd);
        assert!(!block.borrow().context().session.is_active());
        assert_eq!(block.borrow().state(), BlockState::Idle);
    }

    #[test]
    fn hover_marks_zone_and_leave_clears() {
        let (_host, block) = setup(&["a", "b"]);
        BlockInstance::drag_start(&block, 0).unwrap();
        let bounds = Bounds::new(200.0, 0.0, 200.0, 100.0);

        let marker = BlockInstance::drag_over(
            &block,
            Point::new(390.0, 50.0),
            &DropTarget::Image { index: 1, bounds },
        );
        assert_eq!(
            marker,
            Some(DropMarker::Zone {
                zone: DropZone::Right,
                index: 1
            })
        );
        assert!(block.borrow_mut().drag_leave());
        assert_eq!(block.borrow().state(), BlockState::Dragging { index: 0 });
    }

    #[test]
    fn hovering_own_block_keeps_source_tile_dragging() {
        let (_host, block) = setup(&["a", "b"]);
        BlockInstance::drag_start(&block, 1).unwrap();

        BlockInstance::drag_over(
            &block,
            Point::new(10.0, 50.0),
            &DropTarget::Image {
                index: 0,
                bounds: Bounds::new(0.0, 0.0, 200.0, 100.0),
            },
        );
        let state = block.borrow().state();
        assert_eq!(state.dragging_index(), Some(1));
        assert_eq!(
            state.marker(),
            Some(DropMarker::Zone {
                zone: DropZone::Left,
                index: 0
            })
        );

        assert!(block.borrow_mut().drag_leave());
        assert_eq!(block.borrow().state(), BlockState::Dragging { index: 1 });
    }

    #[test]
    fn repeated_dragover_on_same_marker_skips_rerender() {
        let (_host, block) = setup(&["a", "b"]);
        BlockInstance::drag_start(&block, 0).unwrap();
        let over = |x: f64| GalleryEvent::DragOver {
            pointer: Point::new(x, 50.0),
            target: DropTarget::Image {
                index: 1,
                bounds: Bounds::new(200.0, 0.0, 200.0, 100.0),
            },
        };

        assert!(BlockInstance::handle(&block, over(390.0)).rerender);
        assert!(!BlockInstance::handle(&block, over(385.0)).rerender);
        assert!(BlockInstance::handle(&block, over(210.0)).rerender);
    }

    #[test]
    fn hover_without_drag_does_nothing() {
        let (_host, block) = setup(&["a"]);
        let marker = BlockInstance::drag_over(
            &block,
            Point::new(0.0, 0.0),
            &DropTarget::Block { items: Vec::new() },
        );
        assert_eq!(marker, None);
    }

    #[test]
    fn drop_without_session_is_invalid() {
        let (_host, block) = setup(&["a"]);
        let outcome = BlockInstance::drop(
            &block,
            Point::new(0.0, 0.0),
            &DropTarget::Block { items: Vec::new() },
            None,
        );
        assert!(matches!(
            outcome,
            DropOutcome::Rejected(GalleryError::InvalidDropTransfer(_))
        ));
    }

    #[test]
    fn backspace_outside_caption_deletes_active_block() {
        let (host, block) = setup(&["a"]);
        BlockInstance::handle(&block, GalleryEvent::Click { inside: true });

        let r = BlockInstance::handle(
            &block,
            GalleryEvent::Key {
                key: "Backspace".into(),
                caption_focused: true,
            },
        );
        assert!(!r.deleted);
        assert_eq!(host.block_count(), 1);

        let r = BlockInstance::handle(
            &block,
            GalleryEvent::Key {
                key: "Backspace".into(),
                caption_focused: false,
            },
        );
        assert!(r.deleted);
        assert_eq!(host.block_count(), 0);
    }

    #[test]
    fn backspace_when_idle_is_ignored() {
        let (host, block) = setup(&["a"]);
        let r = BlockInstance::handle(
            &block,
            GalleryEvent::Key {
                key: "Backspace".into(),
                caption_focused: false,
            },
        );
        assert!(!r.deleted);
        assert_eq!(host.block_count(), 1);
    }

    #[test]
    fn read_only_blocks_do_not_activate_or_drag() {
        let (_host, block) = setup(&["a"]);
        block.borrow_mut().set_read_only(true);
        assert!(!block.borrow_mut().set_active(true));
        assert!(BlockInstance::drag_start(&block, 0).is_err());
    }
}
