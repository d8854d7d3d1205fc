//! Driftmix Store - Saved mix persistence
//!
//! Keeps the user's saved mixes in a versioned JSON file:
//! - Ordered list with last-write-wins replacement by id
//! - Schema migration from the unversioned format
//! - Atomic replace on every write

pub mod store;

pub use store::{MixFile, MixStore, CURRENT_VERSION};
