//! Durable Offline Queue
//!
//! Two collections of user actions taken while offline (`offlineRatings`
//! and `offlineFavorites`), kept until the sync drain delivers them.
//!
//! - Insert-only: adding an id that already exists is a `ConstraintError`
//! - Every operation is open → transact → close against the backend, so
//!   nothing is held open between calls
//! - Records are encoded with `postcard`; the JSON the backend receives is
//!   built separately by `PendingRecord::to_wire_json`

mod file;
mod memory;
mod record;
mod store;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use record::{Collection, NewRecord, PendingAction, PendingRecord};
pub use store::{OfflineQueue, StoreBackend};
