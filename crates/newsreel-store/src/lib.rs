//! Persisted state for the Newsreel worker.
//!
//! Two small stores survive process restarts: the account rotation
//! cursor (a single integer) and the duplicate-marker ledger (one
//! record per successfully uploaded article). Both sit behind traits
//! so tests can substitute in-memory fakes; the on-disk layout is an
//! implementation detail.

pub mod cursor;
pub mod error;
pub mod ledger;

pub use cursor::{CursorStore, FsCursorStore, MemoryCursorStore};
pub use error::{StoreError, StoreResult};
pub use ledger::{FsLedger, MemoryLedger, ProcessedLedger, ProcessedMarker};
