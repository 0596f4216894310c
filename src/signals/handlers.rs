//! The asynchronous half of job control: the reaper and the forwarders.
//!
//! These run in signal-handler context and may interrupt the read-eval
//! loop at almost any instruction. They touch only the gated job table
//! (preallocated, non-allocating operations) and `sio` raw writes, and
//! they preserve errno for the interrupted code.

use nix::errno::Errno;
use nix::libc;
use nix::sys::signal::{killpg, sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};

use crate::jobs::{self, JobState};
use crate::signals::gate::job_control_set;
use crate::sio;

/// Install all of the shell's signal handlers.
///
/// Every handler runs with the full job-control set in its `sa_mask`,
/// which is what makes handler-side table access exclusive without an
/// explicit gate. SIGTTIN/SIGTTOU are ignored outright so backgrounded
/// jobs never stall the shell on terminal-control signals.
pub fn install() -> nix::Result<()> {
    let mask = job_control_set();

    let reaper = SigAction::new(SigHandler::Handler(handle_sigchld), SaFlags::SA_RESTART, mask);
    unsafe { sigaction(Signal::SIGCHLD, &reaper)? };

    let forwarder = SigAction::new(
        SigHandler::Handler(forward_to_foreground),
        SaFlags::SA_RESTART,
        mask,
    );
    unsafe { sigaction(Signal::SIGINT, &forwarder)? };
    unsafe { sigaction(Signal::SIGTSTP, &forwarder)? };

    let quit = SigAction::new(SigHandler::Handler(handle_sigquit), SaFlags::SA_RESTART, mask);
    unsafe { sigaction(Signal::SIGQUIT, &quit)? };

    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(Signal::SIGTTIN, &ignore)? };
    unsafe { sigaction(Signal::SIGTTOU, &ignore)? };

    Ok(())
}

/// Restore default dispositions in a forked child before exec. The
/// child must not inherit the shell's handlers.
pub fn restore_defaults() {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for sig in [
        Signal::SIGCHLD,
        Signal::SIGINT,
        Signal::SIGTSTP,
        Signal::SIGQUIT,
        Signal::SIGTTIN,
        Signal::SIGTTOU,
    ] {
        let _ = unsafe { sigaction(sig, &default) };
    }
}

/// The reaper. One SIGCHLD delivery may stand for several state
/// changes (pending signals do not queue), so it drains every child
/// that changed state before returning.
extern "C" fn handle_sigchld(_sig: libc::c_int) {
    let saved_errno = Errno::last_raw();
    reap_children();
    Errno::set_raw(saved_errno);
}

fn reap_children() {
    jobs::with_from_handler(|table| loop {
        match waitpid(None, Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Exited(pid, _)) => {
                // normal exit: delete silently
                table.remove(pid);
            }
            Ok(WaitStatus::Signaled(pid, signal, _)) => {
                if let Some(job) = table.by_pid(pid) {
                    sio::job_signal_event("terminated", job.jid, pid.as_raw(), signal as i32);
                }
                table.remove(pid);
            }
            Ok(WaitStatus::Stopped(pid, signal)) => {
                if let Some(job) = table.by_pid_mut(pid) {
                    job.state = JobState::Stopped;
                    sio::job_signal_event("stopped", job.jid, pid.as_raw(), signal as i32);
                }
            }
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(_) => continue,
            Err(_) => {
                sio::put("jsh: waitpid error\n");
                break;
            }
        }
    });
}

/// The forwarder, shared by SIGINT and SIGTSTP. Relays the signal to
/// the entire foreground process group; with no foreground job the
/// signal is swallowed, so ctrl-C at the prompt never kills the shell.
extern "C" fn forward_to_foreground(sig: libc::c_int) {
    let saved_errno = Errno::last_raw();
    if let Ok(signal) = Signal::try_from(sig) {
        jobs::with_from_handler(|table| {
            if let Some(pid) = table.foreground_pid() {
                let _ = killpg(pid, signal);
            }
        });
    }
    Errno::set_raw(saved_errno);
}

extern "C" fn handle_sigquit(_sig: libc::c_int) {
    sio::put("Terminating after receipt of SIGQUIT signal\n");
    unsafe { libc::_exit(1) };
}
