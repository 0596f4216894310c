use std::io;
use std::os::fd::AsRawFd;

use clap::Parser;
use nix::unistd::dup2;
use tracing_subscriber::EnvFilter;

use jsh::config::ShellConfig;
use jsh::shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "jsh")]
#[command(version)]
#[command(about = "A tiny job-control shell")]
struct Args {
    /// Emit additional diagnostic information
    #[arg(short, long)]
    verbose: bool,

    /// Do not print the command prompt (for driver scripts)
    #[arg(short = 'p', long)]
    no_prompt: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    // Driver scripts read one stream: send stderr where stdout goes.
    dup2(io::stdout().as_raw_fd(), io::stderr().as_raw_fd())?;

    let config = if args.no_prompt {
        ShellConfig::new().without_prompt()
    } else {
        ShellConfig::new()
    };

    Shell::new(config).run()?;
    Ok(())
}
