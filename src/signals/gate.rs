//! The signal gate: the only synchronization primitive in the shell.
//!
//! The read-eval loop and the signal handlers share one job table. There
//! is no second thread, so no mutex; mutual exclusion is achieved by
//! blocking the job-control signal set around every main-line access.
//! Handler-side access is already exclusive because each handler is
//! installed with the same set in its `sa_mask`.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{sigprocmask, SigSet, Signal, SigmaskHow};

/// The fixed set of job-control signals the gate blocks.
pub fn job_control_set() -> SigSet {
    let mut set = SigSet::empty();
    set.add(Signal::SIGCHLD);
    set.add(Signal::SIGINT);
    set.add(Signal::SIGTSTP);
    set
}

/// Proof that the job-control signals are blocked on this thread.
///
/// Constructed by [`Blocked::enter`], which saves the previous mask;
/// dropping the guard restores it. The guard doubles as the suspension
/// point for "wait until the foreground job changes state": `suspend`
/// atomically installs the saved (unblocked) mask and sleeps until any
/// signal arrives, so a wakeup delivered between the mask swap and the
/// sleep can never be lost.
#[derive(Debug)]
pub struct Blocked {
    saved: SigSet,
}

impl Blocked {
    /// Block the job-control set, remembering the previous mask.
    pub fn enter() -> nix::Result<Self> {
        let mut saved = SigSet::empty();
        sigprocmask(
            SigmaskHow::SIG_BLOCK,
            Some(&job_control_set()),
            Some(&mut saved),
        )?;
        Ok(Self { saved })
    }

    /// Atomically unblock and wait for any signal, then re-block.
    ///
    /// Returns after one signal has been delivered and its handler has
    /// run. Callers re-check their wait condition in a loop.
    pub fn suspend(&self) {
        // sigsuspend always returns -1/EINTR once a handler has run
        let _ = self.saved.suspend();
    }

    /// The mask in effect before the gate was entered. The launcher
    /// installs this in the child before exec.
    pub fn saved_mask(&self) -> &SigSet {
        &self.saved
    }
}

impl Drop for Blocked {
    fn drop(&mut self) {
        let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.saved), None);
    }
}

/// A cell whose contents may only be touched while the job-control
/// signals cannot preempt the access.
///
/// Main-line code proves this by presenting a [`Blocked`] guard;
/// handler code enters directly because its `sa_mask` already blocks
/// the whole set. The `busy` flag is a runtime check that the
/// discipline is actually upheld.
pub struct GatedCell<T> {
    value: UnsafeCell<T>,
    busy: AtomicBool,
}

// Safety: the process is single-threaded; the only reentrancy is signal
// delivery, which the masking discipline excludes for every access path.
unsafe impl<T: Send> Sync for GatedCell<T> {}

impl<T> GatedCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
            busy: AtomicBool::new(false),
        }
    }

    /// Access under a caller-held gate.
    pub fn with_blocked<R>(&self, _gate: &Blocked, f: impl FnOnce(&mut T) -> R) -> R {
        self.enter(f)
    }

    /// Access from signal-handler context, where `sa_mask` already
    /// blocks the job-control set for the duration of the handler.
    pub fn with_from_handler<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.enter(f)
    }

    fn enter<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let was_busy = self.busy.swap(true, Ordering::Acquire);
        debug_assert!(!was_busy, "gated cell entered reentrantly");
        // Safety: exclusive by the masking discipline checked above.
        let result = f(unsafe { &mut *self.value.get() });
        self.busy.store(false, Ordering::Release);
        result
    }
}
