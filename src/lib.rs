//! jsh - a tiny shell with POSIX job control.
//!
//! The shell launches programs as child process groups and moves them
//! between foreground, background, and stopped states (ctrl-C, ctrl-Z,
//! `bg`, `fg`, `jobs`). All coordination between the read-eval loop and
//! the asynchronous signal handlers goes through the signal gate in
//! [`signals::gate`].

pub mod builtins;
pub mod config;
pub mod error;
pub mod jobs;
pub mod launcher;
pub mod parser;
pub mod redirect;
pub mod shell;
pub mod signals;
pub mod sio;
