use nix::unistd::Pid;

/// Longest command line retained for `jobs`/`bg`/`fg` notifications.
pub const MAX_CMDLINE: usize = 1024;

/// State of one tracked job. A live job is always in exactly one of
/// these states; there is no "undefined" slot value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Foreground,
    Background,
    Stopped,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Foreground => write!(f, "FOREGROUND"),
            JobState::Background => write!(f, "BACKGROUND"),
            JobState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Shell-local handle for a job, distinct from the OS pid.
pub type JobId = usize;

/// One tracked child process group.
#[derive(Debug, Clone)]
pub struct Job {
    pub jid: JobId,
    /// Pid of the group leader; equals the process-group id because the
    /// launcher places every child in its own group.
    pub pid: Pid,
    pub state: JobState,
    pub cmdline: String,
}

impl Job {
    pub fn new(jid: JobId, pid: Pid, state: JobState, cmdline: &str) -> Self {
        let mut cmdline = cmdline.to_string();
        if cmdline.len() > MAX_CMDLINE {
            let mut cut = MAX_CMDLINE;
            while !cmdline.is_char_boundary(cut) {
                cut -= 1;
            }
            cmdline.truncate(cut);
        }
        Self {
            jid,
            pid,
            state,
            cmdline,
        }
    }
}
