//! The shell's two file-descriptor-redirection slots.
//!
//! External jobs redirect in the child after fork, so nothing needs
//! restoring. Builtins run inside the shell process, so their
//! redirections dup the original descriptors aside and put them back
//! when the guard drops.

use std::fs::File;
use std::io::Write;
use std::os::fd::AsRawFd;

use nix::libc;
use nix::unistd::{close, dup, dup2};

use crate::error::Result;
use crate::parser::CommandLine;

/// Restores the shell's stdin/stdout when dropped.
#[derive(Debug)]
pub struct RedirectGuard {
    saved_stdin: Option<i32>,
    saved_stdout: Option<i32>,
}

/// Apply a command's redirections to the shell's own descriptors.
pub fn apply(cmd: &CommandLine) -> Result<RedirectGuard> {
    let mut guard = RedirectGuard {
        saved_stdin: None,
        saved_stdout: None,
    };

    if let Some(path) = &cmd.infile {
        let file = File::open(path)?;
        guard.saved_stdin = Some(dup(libc::STDIN_FILENO)?);
        dup2(file.as_raw_fd(), libc::STDIN_FILENO)?;
    }
    if let Some(path) = &cmd.outfile {
        let file = File::create(path)?;
        let _ = std::io::stdout().flush();
        guard.saved_stdout = Some(dup(libc::STDOUT_FILENO)?);
        dup2(file.as_raw_fd(), libc::STDOUT_FILENO)?;
    }
    Ok(guard)
}

impl Drop for RedirectGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.saved_stdout.take() {
            // flush anything the builtin buffered before the switch back
            let _ = std::io::stdout().flush();
            let _ = dup2(saved, libc::STDOUT_FILENO);
            let _ = close(saved);
        }
        if let Some(saved) = self.saved_stdin.take() {
            let _ = dup2(saved, libc::STDIN_FILENO);
            let _ = close(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::parser;

    #[test]
    fn no_redirections_is_a_noop_guard() {
        let cmd = parser::parse("jobs").unwrap().unwrap();
        let guard = apply(&cmd).unwrap();
        assert!(guard.saved_stdin.is_none());
        assert!(guard.saved_stdout.is_none());
    }

    #[test]
    fn missing_infile_reports_an_error() {
        let cmd = parser::parse("jobs < /definitely/not/here").unwrap().unwrap();
        assert!(apply(&cmd).is_err());
    }

    #[test]
    fn stdout_redirection_lands_in_the_file_and_restores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let line = format!("jobs > {}", path.display());
        let cmd = parser::parse(&line).unwrap().unwrap();

        {
            let _guard = apply(&cmd).unwrap();
            // write through the real descriptor; the test harness does
            // not capture direct handle writes
            let mut out = std::io::stdout().lock();
            out.write_all(b"redirected hello\n").unwrap();
            out.flush().unwrap();
        }

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert!(contents.contains("redirected hello"));
    }
}
