use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("too many jobs (limit is {0})")]
    TableFull(usize),

    #[error("{0}: no such job")]
    JobNotFound(String),

    #[error("job [{0}] is not stopped")]
    NotStopped(usize),

    #[error("{0}: argument must be a pid or %jid")]
    BadJobRef(String),

    #[error("{0} command requires a pid or %jid argument")]
    MissingJobArg(&'static str),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("command line contains an interior NUL byte")]
    InvalidCommand,

    #[error("system call failed: {0}")]
    Sys(#[from] nix::errno::Errno),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShellError>;
