//! The read-eval loop: prompt, read a line, dispatch to a builtin or
//! the launcher. Everything here is main-line code; the asynchronous
//! side lives in [`crate::signals::handlers`].

use std::io::{self, BufRead, Write};

use crate::builtins;
use crate::config::ShellConfig;
use crate::error::Result;
use crate::jobs;
use crate::launcher;
use crate::parser;
use crate::redirect;
use crate::signals::handlers;

pub struct Shell {
    config: ShellConfig,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        Self { config }
    }

    /// Initialize job control and run the loop until EOF or `quit`.
    pub fn run(&mut self) -> Result<()> {
        jobs::init(self.config.max_jobs)?;
        handlers::install()?;
        tracing::debug!(max_jobs = self.config.max_jobs, "job control initialized");

        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            if self.config.emit_prompt {
                print!("{}", self.config.prompt);
                io::stdout().flush()?;
            }

            line.clear();
            let n = stdin.lock().read_line(&mut line)?;
            if n == 0 {
                // EOF (ctrl-d)
                println!();
                return Ok(());
            }

            self.eval(line.trim_end_matches('\n'));
            io::stdout().flush()?;
        }
    }

    /// Evaluate one command line. Recoverable errors are printed and
    /// the loop continues.
    pub fn eval(&mut self, cmdline: &str) {
        let cmd = match parser::parse(cmdline) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };

        let outcome = match cmd.builtin {
            Some(builtin) => match redirect::apply(&cmd) {
                Ok(_guard) => builtins::dispatch(builtin, &cmd),
                Err(e) => Err(e),
            },
            None => launcher::launch(cmdline, &cmd),
        };

        if let Err(e) = outcome {
            tracing::debug!(error = %e, cmdline, "command failed");
            println!("{}", e);
        }
    }
}
