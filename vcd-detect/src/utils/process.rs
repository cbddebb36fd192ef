//! External tool invocation helpers
//!
//! Both collaborators (downloader and source separator) are long-running
//! command-line tools that start helpers of their own (yt-dlp runs ffmpeg).
//! Each tool runs as the leader of a fresh process group. A pipeline that
//! abandons the call (timeout, client gone) drops the pending
//! [`run_tool`] future, which kills the whole group, not only the leader.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Lines of stderr kept for operator logs
const STDERR_TAIL_LINES: usize = 20;

/// Build a command with the stdio and lifetime policy used for all tools
pub fn tool_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);
    cmd
}

/// Run to completion and capture output
///
/// Dropping the returned future before it completes kills the tool's
/// process group.
pub async fn run_tool(mut cmd: Command) -> std::io::Result<Output> {
    debug!(command = ?cmd.as_std(), "Running external tool");
    let child = cmd.spawn()?;
    let group = ProcessGroupGuard::new(child.id());
    let output = child.wait_with_output().await;
    group.disarm();
    output
}

/// Kills a tool's process group unless disarmed after a normal exit
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pgid) = self.pgid.and_then(|id| libc::pid_t::try_from(id).ok()) {
                debug!(pgid = pgid, "Killing abandoned tool process group");
                // SAFETY: kill(2) takes plain integers; a negative pid addresses the
                // group created by `process_group(0)`, which never includes this process.
                unsafe {
                    libc::kill(-pgid, libc::SIGKILL);
                }
            }
        }
    }
}

/// Last few stderr lines, for diagnostics
pub fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Last non-empty stdout line, trimmed
pub fn last_stdout_line(output: &Output) -> Option<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_string)
}
