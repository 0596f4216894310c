//! The builtin dispatcher: `jobs`, `bg`, `fg`, `quit`, executed
//! directly against the job table under the same gate discipline as
//! the launcher.

use std::io::Write;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;

use crate::error::{Result, ShellError};
use crate::jobs::{self, Job, JobState, JobTable};
use crate::launcher;
use crate::parser::{Builtin, CommandLine};
use crate::signals::Blocked;

/// How a user names a job on the `bg`/`fg` command line: `%jid` or a
/// bare pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRef {
    Jid(usize),
    Pid(Pid),
}

impl JobRef {
    pub fn parse(arg: &str) -> Result<Self> {
        if let Some(jid) = arg.strip_prefix('%') {
            match jid.parse::<usize>() {
                Ok(jid) if jid > 0 => return Ok(JobRef::Jid(jid)),
                _ => return Err(ShellError::BadJobRef(arg.to_string())),
            }
        }
        match arg.parse::<i32>() {
            Ok(pid) if pid > 0 => Ok(JobRef::Pid(Pid::from_raw(pid))),
            _ => Err(ShellError::BadJobRef(arg.to_string())),
        }
    }

    fn resolve_mut<'a>(&self, table: &'a mut JobTable) -> Option<&'a mut Job> {
        match *self {
            JobRef::Jid(jid) => table.get_mut(jid),
            JobRef::Pid(pid) => table.by_pid_mut(pid),
        }
    }
}

/// Run a builtin. `quit` does not return.
pub fn dispatch(builtin: Builtin, cmd: &CommandLine) -> Result<()> {
    match builtin {
        Builtin::Quit => quit(),
        Builtin::Jobs => list_jobs(),
        Builtin::Bg => background(job_arg(cmd, "bg")?),
        Builtin::Fg => foreground(job_arg(cmd, "fg")?),
    }
}

fn job_arg(cmd: &CommandLine, name: &'static str) -> Result<JobRef> {
    let arg = cmd
        .argv
        .get(1)
        .ok_or(ShellError::MissingJobArg(name))?;
    JobRef::parse(arg)
}

/// Terminate the shell immediately. Children are left to be reparented
/// by the operating system.
fn quit() -> ! {
    std::process::exit(0)
}

/// Print every live job, ascending by job id.
fn list_jobs() -> Result<()> {
    let gate = Blocked::enter()?;
    jobs::with_blocked(&gate, |table| {
        let mut out = std::io::stdout().lock();
        for job in table.iter() {
            let _ = writeln!(out, "[{}] ({}) {} {}", job.jid, job.pid, job.state, job.cmdline);
        }
    });
    Ok(())
}

/// `bg`: continue a stopped job in the background.
fn background(job_ref: JobRef) -> Result<()> {
    let gate = Blocked::enter()?;
    jobs::with_blocked(&gate, |table| -> Result<()> {
        let job = job_ref
            .resolve_mut(table)
            .ok_or_else(|| ShellError::JobNotFound(describe(job_ref)))?;
        if job.state != JobState::Stopped {
            return Err(ShellError::NotStopped(job.jid));
        }
        // Whole process group, so grouped children resume together
        killpg(job.pid, Signal::SIGCONT)?;
        job.state = JobState::Background;
        println!("[{}] ({}) {}", job.jid, job.pid, job.cmdline);
        Ok(())
    })
}

/// `fg`: give a stopped or background job the foreground and wait for
/// it to change state again.
fn foreground(job_ref: JobRef) -> Result<()> {
    let gate = Blocked::enter()?;
    jobs::with_blocked(&gate, |table| -> Result<()> {
        let job = job_ref
            .resolve_mut(table)
            .ok_or_else(|| ShellError::JobNotFound(describe(job_ref)))?;
        if job.state == JobState::Stopped {
            killpg(job.pid, Signal::SIGCONT)?;
        }
        job.state = JobState::Foreground;
        Ok(())
    })?;
    launcher::wait_foreground(&gate);
    Ok(())
}

fn describe(job_ref: JobRef) -> String {
    match job_ref {
        JobRef::Jid(jid) => format!("%{}", jid),
        JobRef::Pid(pid) => pid.to_string(),
    }
}
