//! Observation data access.
//!
//! Loading from SQLite and the immutable snapshot every view reads from.

pub mod loader;
pub mod snapshot;

pub use loader::load_observations;
pub use snapshot::{Snapshot, SnapshotStore};
