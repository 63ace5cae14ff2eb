//! Host editor collaborator.
//!
//! The host owns the persisted block list and the block lifecycle. Gallery
//! blocks only ask it to insert, delete, and update blocks; every request a
//! drop makes is first planned as a `HostCommand` and applied afterwards,
//! because the host may call back into block instances while it inserts or
//! deletes.

use gallery_core::{BlockData, BlockId, HostError};
use std::cell::{Cell, RefCell};

/// A host-side reference to one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockHandle {
    pub id: BlockId,
    pub kind: String,
}

/// Capabilities the gallery consumes from the host editor.
pub trait HostEditor {
    /// Create a block of `kind` at `index` (append when `None`).
    fn insert_block(
        &self,
        kind: &str,
        data: &BlockData,
        index: Option<usize>,
        focus: bool,
    ) -> Result<BlockId, HostError>;

    /// Remove the block at `index`, or the current block when `None`.
    fn delete_block(&self, index: Option<usize>) -> Result<(), HostError>;

    /// Replace a block's persisted data.
    fn update_block_data(&self, id: BlockId, data: &BlockData) -> Result<(), HostError>;

    fn get_block_by_index(&self, index: usize) -> Option<BlockHandle>;

    fn current_block_index(&self) -> usize;

    fn block_style_class_name(&self) -> String;

    fn block_count(&self) -> usize {
        (0..).take_while(|&i| self.get_block_by_index(i).is_some()).count()
    }

    /// Position of block `id` in the host's block list.
    fn block_index(&self, id: BlockId) -> Option<usize> {
        (0..)
            .map_while(|i| self.get_block_by_index(i).map(|h| (i, h)))
            .find_map(|(i, h)| (h.id == id).then_some(i))
    }
}

/// A planned host request.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    Update { id: BlockId, data: BlockData },
    Insert { data: BlockData, index: usize },
    Delete { index: usize },
}

/// Apply planned commands in order. Failures are logged and do not stop
/// the remaining commands. Returns the ids of inserted blocks.
pub fn apply_commands(host: &dyn HostEditor, kind: &str, commands: Vec<HostCommand>) -> Vec<BlockId> {
    let mut inserted = Vec::new();
    for command in commands {
        log::debug!("host command: {command:?}");
        let result = match command {
            HostCommand::Update { id, data } => host.update_block_data(id, &data),
            HostCommand::Insert { data, index } => host
                .insert_block(kind, &data, Some(index), false)
                .map(|id| inserted.push(id)),
            HostCommand::Delete { index } => host.delete_block(Some(index)),
        };
        if let Err(err) = result {
            log::warn!("{err}");
        }
    }
    inserted
}

// ─── In-memory host ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlock {
    pub id: BlockId,
    pub kind: String,
    pub data: BlockData,
}

/// A host editor that keeps its block list in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    blocks: RefCell<Vec<StoredBlock>>,
    current: Cell<usize>,
    updates: Cell<usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block and return its id.
    pub fn push(&self, kind: &str, data: BlockData) -> BlockId {
        let id = BlockId::generate();
        self.blocks.borrow_mut().push(StoredBlock {
            id,
            kind: kind.to_string(),
            data,
        });
        id
    }

    pub fn set_current(&self, index: usize) {
        self.current.set(index);
    }

    pub fn data_of(&self, id: BlockId) -> Option<BlockData> {
        self.blocks
            .borrow()
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.data.clone())
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.borrow().iter().map(|b| b.id).collect()
    }

    /// Number of `update_block_data` calls that reached a block.
    pub fn update_count(&self) -> usize {
        self.updates.get()
    }

    pub fn snapshot(&self) -> Vec<StoredBlock> {
        self.blocks.borrow().clone()
    }
}

impl HostEditor for MemoryHost {
    fn insert_block(
        &self,
        kind: &str,
        data: &BlockData,
        index: Option<usize>,
        focus: bool,
    ) -> Result<BlockId, HostError> {
        let mut blocks = self.blocks.borrow_mut();
        let at = index.unwrap_or(blocks.len());
        if at > blocks.len() {
            return Err(HostError::new(format!(
                "insert index {at} out of range (len {})",
                blocks.len()
            )));
        }
        let id = BlockId::generate();
        blocks.insert(
            at,
            StoredBlock {
                id,
                kind: kind.to_string(),
                data: data.clone(),
            },
        );
        if focus {
            self.current.set(at);
        }
        Ok(id)
    }

    fn delete_block(&self, index: Option<usize>) -> Result<(), HostError> {
        let mut blocks = self.blocks.borrow_mut();
        let at = index.unwrap_or(self.current.get());
        if at >= blocks.len() {
            return Err(HostError::new(format!(
                "delete index {at} out of range (len {})",
                blocks.len()
            )));
        }
        blocks.remove(at);
        Ok(())
    }

    fn update_block_data(&self, id: BlockId, data: &BlockData) -> Result<(), HostError> {
        let mut blocks = self.blocks.borrow_mut();
        let block = blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| HostError::new(format!("no block {id}")))?;
        block.data = data.clone();
        self.updates.set(self.updates.get() + 1);
        Ok(())
    }

    fn get_block_by_index(&self, index: usize) -> Option<BlockHandle> {
        self.blocks.borrow().get(index).map(|b| BlockHandle {
            id: b.id,
            kind: b.kind.clone(),
        })
    }

    fn current_block_index(&self) -> usize {
        self.current.get()
    }

    fn block_style_class_name(&self) -> String {
        "ce-block".to_string()
    }

    fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }
}
