use lasso::{Rodeo, Spur};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cell::{Cell, RefCell};
use std::fmt;

thread_local! {
    /// Host block ids seen by this UI thread. Blocks, the drag session and
    /// host commands compare ids on every drag frame, so they are compared
    /// as `Spur` keys instead of strings.
    static INTERNER: RefCell<Rodeo> = RefCell::new(Rodeo::default());
    static NEXT_GENERATED: Cell<u64> = const { Cell::new(0) };
}

/// Identifier of one block in the host editor's block list.
///
/// Only meaningful on the thread that interned it; the whole block editor
/// lives on the UI thread.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(Spur);

impl BlockId {
    /// Intern a host-supplied id, or return the existing one.
    pub fn intern(s: &str) -> Self {
        INTERNER.with(|rodeo| BlockId(rodeo.borrow_mut().get_or_intern(s)))
    }

    /// Call `f` with the id text. `f` must not intern new ids.
    pub fn with_str<R>(&self, f: impl FnOnce(&str) -> R) -> R {
        INTERNER.with(|rodeo| f(rodeo.borrow().try_resolve(&self.0).unwrap_or_default()))
    }

    /// Fresh `gallery_N` id for hosts that do not assign their own.
    pub fn generate() -> Self {
        let n = NEXT_GENERATED.with(|next| {
            let n = next.get();
            next.set(n + 1);
            n
        });
        Self::intern(&format!("gallery_{n}"))
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| write!(f, "block({s})"))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_str(|s| f.write_str(s))
    }
}

impl Serialize for BlockId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_str(|s| serializer.serialize_str(s))
    }
}

impl<'de> Deserialize<'de> for BlockId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(BlockId::intern(&s))
    }
}
