// State management module.
// Access history and the cache/fetch state machine for the repository list.

pub mod ledger;
pub mod sync;

pub use ledger::{ACCESS_TIMES_KEY, AccessLedger};
pub use sync::{Refresh, SyncCoordinator, SyncState};
