//! Persistence of the last known snapshot.
//!
//! The whole state is a single JSON document, read fully at the start of a
//! run and rewritten fully at the end:
//!
//! ```text
//! {workspace}/
//! └── last_known_state.json   # merch_hash, tour_hash, merch_items, tour_dates
//! ```
//!
//! There is no locking; concurrent runs are last-writer-wins.

pub mod local;

use crate::error::Result;
use crate::models::Snapshot;

// Re-export for convenience
pub use local::LocalStorage;

/// Trait for snapshot storage backends.
pub trait StateStore {
    /// Load the last known snapshot, or the first-run sentinel if none exists.
    fn load(&self) -> Result<Snapshot>;

    /// Replace the stored snapshot.
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Where the snapshot lives, for log messages.
    fn location(&self) -> String;
}
