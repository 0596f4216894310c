use nix::unistd::Pid;

use crate::error::{Result, ShellError};
use crate::jobs::job::{Job, JobId, JobState};

/// Fixed-capacity registry of live jobs.
///
/// Slots are preallocated at init; `jid = slot index + 1`, so taking the
/// first free slot yields the lowest available job id and removal makes
/// the id reusable. `remove` and the lookups never allocate, which keeps
/// them safe to call from signal-handler context.
#[derive(Debug)]
pub struct JobTable {
    slots: Vec<Option<Job>>,
}

impl JobTable {
    /// An empty, zero-capacity table. Used as the static initializer;
    /// [`JobTable::with_capacity`] replaces it at startup.
    pub const fn unallocated() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn with_capacity(max_jobs: usize) -> Self {
        Self {
            slots: (0..max_jobs).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Register a job in the lowest free slot. Fails without mutating
    /// anything when the table is full.
    pub fn add(&mut self, pid: Pid, state: JobState, cmdline: &str) -> Result<JobId> {
        debug_assert!(
            state != JobState::Foreground || self.foreground_pid().is_none(),
            "second foreground job registered"
        );
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(ShellError::TableFull(self.slots.len()))?;
        let jid = slot + 1;
        self.slots[slot] = Some(Job::new(jid, pid, state, cmdline));
        Ok(jid)
    }

    /// Remove the job owning `pid`. No-op when no such job exists.
    pub fn remove(&mut self, pid: Pid) {
        for slot in &mut self.slots {
            if slot.as_ref().is_some_and(|j| j.pid == pid) {
                *slot = None;
                return;
            }
        }
    }

    pub fn get(&self, jid: JobId) -> Option<&Job> {
        if jid == 0 || jid > self.slots.len() {
            return None;
        }
        self.slots[jid - 1].as_ref()
    }

    pub fn get_mut(&mut self, jid: JobId) -> Option<&mut Job> {
        if jid == 0 || jid > self.slots.len() {
            return None;
        }
        self.slots[jid - 1].as_mut()
    }

    pub fn by_pid(&self, pid: Pid) -> Option<&Job> {
        self.slots.iter().flatten().find(|j| j.pid == pid)
    }

    pub fn by_pid_mut(&mut self, pid: Pid) -> Option<&mut Job> {
        self.slots.iter_mut().flatten().find(|j| j.pid == pid)
    }

    /// Pid of the current foreground job, if any. At most one job is in
    /// the foreground state at a time.
    pub fn foreground_pid(&self) -> Option<Pid> {
        self.slots
            .iter()
            .flatten()
            .find(|j| j.state == JobState::Foreground)
            .map(|j| j.pid)
    }

    /// Live jobs in ascending job-id order.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.slots.iter().flatten()
    }
}
