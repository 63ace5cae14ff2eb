pub mod block;
pub mod host;
pub mod input;
pub mod intake;
pub mod session;
pub mod view;

pub use block::{BlockContext, BlockInstance, BlockState, DropMarker, DropOutcome, SharedBlock};
pub use host::{BlockHandle, HostCommand, HostEditor, MemoryHost};
pub use session::DragSession;
