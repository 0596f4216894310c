//! The job launcher: fork, process-group setup, exec, registration,
//! and the foreground wait.

use std::ffi::{CStr, CString};

use nix::fcntl::{open, OFlag};
use nix::libc;
use nix::sys::signal::{sigprocmask, SigmaskHow};
use nix::sys::stat::Mode;
use nix::unistd::{close, dup2, execvp, fork, setpgid, ForkResult, Pid};

use crate::error::{Result, ShellError};
use crate::jobs::{self, JobState};
use crate::parser::CommandLine;
use crate::signals::{handlers, Blocked};
use crate::sio;

/// Exec arguments prepared before forking. CString conversion
/// allocates, so it happens on the shell side of the fork; the child
/// only makes async-signal-safe calls.
struct ExecImage {
    prog: CString,
    argv: Vec<CString>,
    infile: Option<CString>,
    outfile: Option<CString>,
}

impl ExecImage {
    fn prepare(cmd: &CommandLine) -> Result<Self> {
        let cstr = |s: &str| CString::new(s).map_err(|_| ShellError::InvalidCommand);
        Ok(Self {
            prog: cstr(&cmd.argv[0])?,
            argv: cmd.argv.iter().map(|s| cstr(s)).collect::<Result<_>>()?,
            infile: cmd.infile.as_deref().map(cstr).transpose()?,
            outfile: cmd.outfile.as_deref().map(cstr).transpose()?,
        })
    }
}

/// Fork and exec an external command, registering it in the job table.
///
/// The gate stays blocked from before the fork until the job is
/// registered, so the reaper can never observe (and delete) a child
/// the table has not seen yet. For a foreground job the call returns
/// only once the job has exited, been killed, or stopped.
pub fn launch(cmdline: &str, cmd: &CommandLine) -> Result<()> {
    let image = ExecImage::prepare(cmd)?;
    let gate = Blocked::enter()?;

    let child = match unsafe { fork() } {
        Ok(ForkResult::Child) => exec_child(&image, &gate),
        Ok(ForkResult::Parent { child }) => {
            // Both sides set the group so it exists no matter which of
            // parent and child is scheduled first; one call is a no-op.
            let _ = setpgid(child, child);
            child
        }
        Err(e) => {
            tracing::error!(error = %e, "fork failed");
            return Err(e.into());
        }
    };

    let state = if cmd.background {
        JobState::Background
    } else {
        JobState::Foreground
    };
    let jid = jobs::with_blocked(&gate, |table| table.add(child, state, cmdline))?;
    tracing::debug!(jid, pid = child.as_raw(), %state, "added job");

    if cmd.background {
        println!("[{}] ({}) {}", jid, child, cmdline);
    } else {
        wait_foreground(&gate);
    }
    Ok(())
}

/// Suspend until no foreground job remains.
///
/// Must be called with the gate blocked. Each `suspend` atomically
/// restores the saved mask and sleeps until a signal arrives; by the
/// time it returns, the reaper has already reconciled the table, so
/// re-checking the condition here is race-free.
pub fn wait_foreground(gate: &Blocked) {
    while jobs::with_blocked(gate, |table| table.foreground_pid().is_some()) {
        gate.suspend();
    }
}

/// The child side of the fork. Never returns.
fn exec_child(image: &ExecImage, gate: &Blocked) -> ! {
    // Own process group, id = own pid: the terminal's signal generation
    // stays confined to the shell's group, and the forwarders deliver
    // interactive signals explicitly.
    let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));

    if let Some(path) = &image.infile {
        redirect_or_die(path, OFlag::O_RDONLY, libc::STDIN_FILENO);
    }
    if let Some(path) = &image.outfile {
        redirect_or_die(
            path,
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            libc::STDOUT_FILENO,
        );
    }

    // Shell's handlers and mask must not leak into the program.
    let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(gate.saved_mask()), None);
    handlers::restore_defaults();

    let _ = execvp(&image.prog, &image.argv);
    sio::put(image.prog.to_str().unwrap_or("jsh"));
    sio::put(": Command not found\n");
    unsafe { libc::_exit(1) }
}

fn redirect_or_die(path: &CStr, flags: OFlag, target: libc::c_int) {
    let mode = Mode::from_bits_truncate(0o644);
    match open(path, flags, mode) {
        Ok(fd) => {
            if dup2(fd, target).is_err() {
                sio::put("jsh: dup2 error\n");
                unsafe { libc::_exit(1) }
            }
            let _ = close(fd);
        }
        Err(_) => {
            sio::put(path.to_str().unwrap_or("jsh"));
            sio::put(": cannot open file\n");
            unsafe { libc::_exit(1) }
        }
    }
}
