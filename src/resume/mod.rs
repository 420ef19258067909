//! Resume capability for transfer runs
//!
//! Provides the progress ledger with atomic writes and the advisory run lock.

pub mod atomic;
pub mod ledger;
pub mod lock;

pub use atomic::write_atomic;
pub use ledger::{LedgerError, ProgressLedger, ProgressRecord, MAX_LEDGER_FILE_SIZE};
pub use lock::RunLock;
