//! Async-signal-safe console output.
//!
//! The reaper and forwarders run in handler context, where buffered or
//! allocating output is off-limits. Everything here formats into a
//! stack buffer and goes out through raw `write(2)` calls.

use nix::libc;

/// Write a string straight to stdout, retrying on short writes.
pub fn put(s: &str) {
    put_bytes(s.as_bytes());
}

fn put_bytes(mut buf: &[u8]) {
    while !buf.is_empty() {
        let n = unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                buf.as_ptr() as *const libc::c_void,
                buf.len(),
            )
        };
        if n <= 0 {
            return;
        }
        buf = &buf[n as usize..];
    }
}

/// Stack-allocated line buffer for handler-context messages.
pub struct LineBuf {
    buf: [u8; 256],
    len: usize,
}

impl LineBuf {
    pub fn new() -> Self {
        Self {
            buf: [0; 256],
            len: 0,
        }
    }

    pub fn push(&mut self, s: &str) -> &mut Self {
        for &b in s.as_bytes() {
            if self.len == self.buf.len() {
                break;
            }
            self.buf[self.len] = b;
            self.len += 1;
        }
        self
    }

    pub fn push_num(&mut self, mut n: i64) -> &mut Self {
        if n < 0 {
            self.push("-");
            n = -n;
        }
        let mut digits = [0u8; 20];
        let mut i = digits.len();
        loop {
            i -= 1;
            digits[i] = b'0' + (n % 10) as u8;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        for &d in &digits[i..] {
            if self.len == self.buf.len() {
                break;
            }
            self.buf[self.len] = d;
            self.len += 1;
        }
        self
    }

    /// Write the accumulated line to stdout.
    pub fn flush(&mut self) {
        put_bytes(&self.buf[..self.len]);
        self.len = 0;
    }
}

impl Default for LineBuf {
    fn default() -> Self {
        Self::new()
    }
}

/// Emit `Job [jid] (pid) <event> by signal <n>\n`, the notification
/// format for jobs terminated or stopped by a signal.
pub fn job_signal_event(event: &str, jid: usize, pid: i32, signum: i32) {
    let mut line = LineBuf::new();
    line.push("Job [")
        .push_num(jid as i64)
        .push("] (")
        .push_num(pid as i64)
        .push(") ")
        .push(event)
        .push(" by signal ")
        .push_num(signum as i64)
        .push("\n");
    line.flush();
}
