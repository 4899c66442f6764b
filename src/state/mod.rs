//! Release state tracking.
//!
//! [`ReleaseState`] is the root aggregate of one release. It is rebuilt from
//! the release issue on every run, mutated in place by step actions, and
//! written back to the issue after every mutation.

mod release_state;

pub use release_state::{
    Checklist, GroupEntry, Item, ItemGroup, ItemMut, ItemRef, LinkedItem, MultiLinkedItem,
    ReleaseState,
};
