//! Child process control for the server under test and the attached
//! profiler.
//!
//! Both children run with stderr suppressed, as the measurement cares only
//! about the samples. Teardown sends SIGTERM rather than SIGKILL: `perf`
//! only flushes a usable `perf.data` when it is allowed to exit on its own.

use crate::error::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// Split a CLI-provided server command into program and arguments.
///
/// Accepts either a pre-split argv tail or a single whitespace-separated
/// command string.
pub fn split_command_line(parts: &[String]) -> Result<(String, Vec<String>)> {
	let words: Vec<String> = if parts.len() == 1 {
		parts[0].split_whitespace().map(|s| s.to_string()).collect()
	} else {
		parts.to_vec()
	};
	let mut iter = words.into_iter();
	let program = iter
		.next()
		.filter(|p| !p.is_empty())
		.ok_or_else(|| Error::config("server command is empty"))?;
	Ok((program, iter.collect()))
}

#[cfg(unix)]
fn send_term(pid: u32, who: &str) {
	use nix::sys::signal::{kill, Signal};
	use nix::unistd::Pid;
	if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
		warn!(pid, who, "failed to signal termination: {e}");
	}
}

#[cfg(not(unix))]
fn send_term(_pid: u32, _who: &str) {
	// No SIGTERM off Unix; callers fall through to the bounded kill path.
}

async fn reap(mut child: Child, pid: u32, who: &str, limit: Duration) -> Result<()> {
	#[cfg(not(unix))]
	{
		let _ = child.start_kill();
	}
	match timeout(limit, child.wait()).await {
		Ok(Ok(status)) => {
			info!(pid, who, %status, "process exited");
			Ok(())
		}
		Ok(Err(e)) => Err(Error::Io(e)),
		Err(_) => {
			warn!(pid, who, "did not exit within {limit:?}, killing");
			child.kill().await.map_err(Error::Io)
		}
	}
}

/// Handle to the server process being profiled.
#[derive(Debug)]
pub struct ServerHandle {
	child: Child,
	pid: u32,
}

impl ServerHandle {
	/// Launch the server command with stderr suppressed.
	pub fn spawn(command: &[String]) -> Result<Self> {
		let (program, args) = split_command_line(command)?;
		let child = Command::new(&program)
			.args(&args)
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::process(format!("failed to spawn server `{program}`: {e}")))?;
		let pid = child
			.id()
			.ok_or_else(|| Error::process("server exited before its pid could be read"))?;
		info!(pid, %program, "server started");
		Ok(Self { child, pid })
	}

	pub fn pid(&self) -> u32 {
		self.pid
	}

	/// Poll the target address until it accepts a TCP connection or the
	/// timeout elapses. Returns whether the server became ready; callers
	/// are expected to shoot anyway on timeout.
	pub async fn wait_ready(&self, target: &str, limit: Duration) -> bool {
		let start = Instant::now();
		loop {
			if start.elapsed() > limit {
				warn!(target, "server not accepting connections after {limit:?}");
				return false;
			}
			match TcpStream::connect(target).await {
				Ok(_) => {
					debug!(target, elapsed = ?start.elapsed(), "server ready");
					return true;
				}
				Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
			}
		}
	}

	/// Request termination and reap the process, killing it if it lingers.
	pub async fn terminate(self) -> Result<()> {
		send_term(self.pid, "server");
		reap(self.child, self.pid, "server", REAP_TIMEOUT).await
	}
}

/// Handle to the sampling profiler attached to the server pid.
pub struct ProfilerHandle {
	child: Child,
	pid: u32,
}

impl ProfilerHandle {
	/// Start `<perf_bin> record -p <pid> -o <perf_data>`.
	pub fn attach(target_pid: u32, perf_bin: &str, perf_data: &Path) -> Result<Self> {
		let child = Command::new(perf_bin)
			.arg("record")
			.arg("-p")
			.arg(target_pid.to_string())
			.arg("-o")
			.arg(perf_data)
			.stderr(Stdio::null())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::process(format!("failed to spawn profiler `{perf_bin}`: {e}")))?;
		let pid = child
			.id()
			.ok_or_else(|| Error::process("profiler exited before its pid could be read"))?;
		info!(pid, target_pid, "profiler attached");
		Ok(Self { child, pid })
	}

	/// Signal the profiler to stop and wait for it to flush and exit.
	pub async fn stop(self) -> Result<()> {
		send_term(self.pid, "profiler");
		reap(self.child, self.pid, "profiler", REAP_TIMEOUT * 2).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn split_pre_split_argv() {
		let parts: Vec<String> =
			["./game_server", "--config", "data/config.json"].iter().map(|s| s.to_string()).collect();
		let (program, args) = split_command_line(&parts).unwrap();
		assert_eq!(program, "./game_server");
		assert_eq!(args, vec!["--config", "data/config.json"]);
	}

	#[test]
	fn split_single_string() {
		let parts = vec!["./game_server --tick-period 50".to_string()];
		let (program, args) = split_command_line(&parts).unwrap();
		assert_eq!(program, "./game_server");
		assert_eq!(args, vec!["--tick-period", "50"]);
	}

	#[test]
	fn split_rejects_empty() {
		assert!(split_command_line(&[]).is_err());
		assert!(split_command_line(&[String::new()]).is_err());
		assert!(split_command_line(&["   ".to_string()]).is_err());
	}

	#[tokio::test]
	async fn spawn_missing_binary_is_a_process_error() {
		let cmd = vec!["./definitely-not-a-real-server-binary".to_string()];
		let err = ServerHandle::spawn(&cmd).unwrap_err();
		assert!(matches!(err, Error::Process(_)));
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn spawn_and_terminate_reaps_the_child() {
		let cmd = vec!["sleep".to_string(), "30".to_string()];
		let server = ServerHandle::spawn(&cmd).unwrap();
		assert!(server.pid() > 0);
		// SIGTERM ends sleep well before the reap timeout.
		server.terminate().await.unwrap();
	}

	#[tokio::test]
	async fn wait_ready_times_out_on_closed_port() {
		let cmd = if cfg!(unix) {
			vec!["sleep".to_string(), "5".to_string()]
		} else {
			vec!["cmd".to_string(), "/C".to_string(), "timeout 5".to_string()]
		};
		let server = ServerHandle::spawn(&cmd).unwrap();
		let ready = server.wait_ready("127.0.0.1:1", Duration::from_millis(300)).await;
		assert!(!ready);
		let _ = server.terminate().await;
	}
}
