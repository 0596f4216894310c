//! End-to-end tests driving the built `jsh` binary over a pipe.
//!
//! The shell runs with `-p` so its output is exactly the notification
//! lines and job listings. Signals are delivered to job process groups
//! from out here, standing in for a user at the terminal.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::sleep;
use std::time::Duration;

use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;

const SETTLE: Duration = Duration::from_millis(500);

struct ShellUnderTest {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl ShellUnderTest {
    fn spawn() -> Self {
        let mut child = Command::new(env!("CARGO_BIN_EXE_jsh"))
            .arg("-p")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("failed to spawn jsh");
        let stdin = child.stdin.take().unwrap();
        let stdout = BufReader::new(child.stdout.take().unwrap());
        Self {
            child,
            stdin,
            stdout,
        }
    }

    fn send(&mut self, line: &str) {
        self.stdin.write_all(line.as_bytes()).unwrap();
        self.stdin.write_all(b"\n").unwrap();
        self.stdin.flush().unwrap();
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.stdout.read_line(&mut line).unwrap();
        line.trim_end_matches('\n').to_string()
    }

    /// Send `quit`, collect any remaining output, and reap the shell.
    fn finish(mut self) -> String {
        self.send("quit");
        drop(self.stdin);
        let mut rest = String::new();
        self.stdout.read_to_string(&mut rest).unwrap();
        let status = self.child.wait().unwrap();
        assert!(status.success(), "shell exited with {:?}", status);
        rest
    }
}

/// Pid printed in a `[jid] (pid) cmdline` notification.
fn pid_from_notification(line: &str) -> Pid {
    let open = line.find('(').expect("no '(' in notification");
    let close = line.find(')').expect("no ')' in notification");
    let pid: i32 = line[open + 1..close].parse().expect("pid not numeric");
    Pid::from_raw(pid)
}

#[test]
fn test_foreground_command_runs_to_completion() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("echo hello");
    assert_eq!(sh.read_line(), "hello");
    sh.finish();
}

#[test]
fn test_background_job_prints_one_notification() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 1 &");
    let line = sh.read_line();
    assert!(line.starts_with("[1] ("), "got: {line}");
    assert!(line.ends_with(") sleep 1 &"), "got: {line}");

    // control returned immediately: the shell answers while the job runs
    sh.send("echo still here");
    assert_eq!(sh.read_line(), "still here");
    sh.finish();
}

#[test]
fn test_jobs_lists_background_job() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 1 &");
    let pid = pid_from_notification(&sh.read_line());

    sh.send("jobs");
    let listing = sh.read_line();
    assert_eq!(listing, format!("[1] ({}) BACKGROUND sleep 1 &", pid));
    sh.finish();
}

#[test]
fn test_interrupt_terminates_background_job() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 30 &");
    let pid = pid_from_notification(&sh.read_line());

    killpg(pid, Signal::SIGINT).unwrap();
    sleep(SETTLE);

    sh.send("jobs");
    let rest = sh.finish();
    assert!(
        rest.contains(&format!("Job [1] ({}) terminated by signal 2", pid)),
        "got: {rest}"
    );
    // the table is empty again: jobs printed nothing
    assert!(!rest.contains("BACKGROUND"), "got: {rest}");
}

#[test]
fn test_stop_then_bg_resumes_job() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 30 &");
    let pid = pid_from_notification(&sh.read_line());

    killpg(pid, Signal::SIGTSTP).unwrap();
    let stopped = sh.read_line();
    assert_eq!(
        stopped,
        format!("Job [1] ({}) stopped by signal {}", pid, Signal::SIGTSTP as i32)
    );

    sh.send("jobs");
    assert_eq!(
        sh.read_line(),
        format!("[1] ({}) STOPPED sleep 30 &", pid)
    );

    sh.send("bg %1");
    assert_eq!(sh.read_line(), format!("[1] ({}) sleep 30 &", pid));
    sh.send("jobs");
    assert_eq!(
        sh.read_line(),
        format!("[1] ({}) BACKGROUND sleep 30 &", pid)
    );

    killpg(pid, Signal::SIGINT).unwrap();
    sleep(SETTLE);
    sh.finish();
}

#[test]
fn test_fg_blocks_until_job_terminates() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 30 &");
    let pid = pid_from_notification(&sh.read_line());

    killpg(pid, Signal::SIGTSTP).unwrap();
    let _stopped = sh.read_line();

    // fg continues the job and claims the foreground; the shell must
    // not answer until the job changes state again
    sh.send("fg %1");
    sleep(SETTLE);
    killpg(pid, Signal::SIGINT).unwrap();

    let terminated = sh.read_line();
    assert_eq!(
        terminated,
        format!("Job [1] ({}) terminated by signal 2", pid)
    );

    sh.send("echo after");
    assert_eq!(sh.read_line(), "after");
    sh.finish();
}

#[test]
fn test_ctrl_c_reaches_only_the_foreground_job() {
    let mut sh = ShellUnderTest::spawn();
    let shell_pid = Pid::from_raw(sh.child.id() as i32);

    sh.send("sleep 30");
    sleep(SETTLE);

    // ctrl-C at the terminal: SIGINT to the shell, which forwards it
    // to the foreground process group and survives itself
    kill(shell_pid, Signal::SIGINT).unwrap();

    let line = sh.read_line();
    assert!(line.starts_with("Job [1] ("), "got: {line}");
    assert!(line.ends_with(") terminated by signal 2"), "got: {line}");

    sh.send("echo survived");
    assert_eq!(sh.read_line(), "survived");
    sh.finish();
}

#[test]
fn test_ctrl_c_with_no_foreground_job_is_swallowed() {
    let mut sh = ShellUnderTest::spawn();
    let shell_pid = Pid::from_raw(sh.child.id() as i32);
    sleep(Duration::from_millis(200));

    kill(shell_pid, Signal::SIGINT).unwrap();
    sleep(Duration::from_millis(200));

    sh.send("echo alive");
    assert_eq!(sh.read_line(), "alive");
    sh.finish();
}

#[test]
fn test_job_id_reuse_across_shell_session() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 30 &");
    let pid1 = pid_from_notification(&sh.read_line());
    sh.send("sleep 30 &");
    let line2 = sh.read_line();
    assert!(line2.starts_with("[2] ("), "got: {line2}");
    let pid2 = pid_from_notification(&line2);

    killpg(pid1, Signal::SIGINT).unwrap();
    let terminated = sh.read_line();
    assert_eq!(
        terminated,
        format!("Job [1] ({}) terminated by signal 2", pid1)
    );

    // jid 1 is free again and must be handed to the next job
    sh.send("sleep 30 &");
    let line3 = sh.read_line();
    assert!(line3.starts_with("[1] ("), "got: {line3}");
    let pid3 = pid_from_notification(&line3);

    killpg(pid2, Signal::SIGINT).unwrap();
    killpg(pid3, Signal::SIGINT).unwrap();
    sleep(SETTLE);
    sh.finish();
}

#[test]
fn test_unknown_job_reference_is_reported() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("fg %7");
    assert_eq!(sh.read_line(), "%7: no such job");
    sh.send("bg 12345");
    assert_eq!(sh.read_line(), "12345: no such job");
    sh.send("fg");
    assert_eq!(sh.read_line(), "fg command requires a pid or %jid argument");
    sh.finish();
}

#[test]
fn test_exec_failure_is_fatal_to_child_only() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("/no/such/program");
    assert_eq!(sh.read_line(), "/no/such/program: Command not found");
    sh.send("echo next");
    assert_eq!(sh.read_line(), "next");
    sh.finish();
}

#[test]
fn test_output_redirection_for_jobs_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.out");

    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 1 &");
    let pid = pid_from_notification(&sh.read_line());
    sh.send(&format!("jobs > {}", path.display()));
    sh.send("echo done");
    assert_eq!(sh.read_line(), "done");
    sh.finish();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents.trim_end(),
        format!("[1] ({}) BACKGROUND sleep 1 &", pid)
    );
}

#[test]
fn test_bg_on_running_job_is_reported() {
    let mut sh = ShellUnderTest::spawn();
    sh.send("sleep 30 &");
    let pid = pid_from_notification(&sh.read_line());

    // the job is running, not stopped; bg must refuse and say so
    sh.send("bg %1");
    assert_eq!(sh.read_line(), "job [1] is not stopped");

    killpg(pid, Signal::SIGINT).unwrap();
    sleep(SETTLE);
    sh.finish();
}

#[test]
fn test_sigquit_terminates_with_notice() {
    let mut sh = ShellUnderTest::spawn();
    let shell_pid = Pid::from_raw(sh.child.id() as i32);
    sleep(Duration::from_millis(200));

    kill(shell_pid, Signal::SIGQUIT).unwrap();
    assert_eq!(
        sh.read_line(),
        "Terminating after receipt of SIGQUIT signal"
    );
    let status = sh.child.wait().unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn test_eof_exits_cleanly() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_jsh"))
        .arg("-p")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    drop(child.stdin.take());
    let status = child.wait().unwrap();
    assert!(status.success());
}
