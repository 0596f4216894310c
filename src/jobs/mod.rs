//! The job table and its process-wide instance.
//!
//! Signal handlers cannot capture state, so the table lives in a single
//! [`GatedCell`] static. Main-line code goes through [`with_blocked`]
//! (holding a [`Blocked`] gate); the reaper and forwarders use
//! [`with_from_handler`], relying on their `sa_mask` for exclusion.

pub mod job;
pub mod table;

pub use job::{Job, JobId, JobState, MAX_CMDLINE};
pub use table::JobTable;

use crate::error::Result;
use crate::signals::{Blocked, GatedCell};

static TABLE: GatedCell<JobTable> = GatedCell::new(JobTable::unallocated());

/// Allocate the table. Called once at startup, before any job exists.
pub fn init(max_jobs: usize) -> Result<()> {
    let gate = Blocked::enter()?;
    TABLE.with_blocked(&gate, |table| *table = JobTable::with_capacity(max_jobs));
    Ok(())
}

/// Access the table under a gate the caller already holds.
pub fn with_blocked<R>(gate: &Blocked, f: impl FnOnce(&mut JobTable) -> R) -> R {
    TABLE.with_blocked(gate, f)
}

/// Access the table from signal-handler context.
pub(crate) fn with_from_handler<R>(f: impl FnOnce(&mut JobTable) -> R) -> R {
    TABLE.with_from_handler(f)
}
