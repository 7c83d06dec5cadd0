//! The three-stage flamegraph rendering pipeline.
//!
//! Equivalent of the shell line
//! `perf script -i perf.data | stackcollapse-perf.pl | flamegraph.pl > graph.svg`,
//! wired with OS pipes instead of a shell. Stage stderr is suppressed and
//! exit statuses are logged without being enforced; a partial pipeline
//! yields a partial (possibly empty) SVG, exactly as the shell version did.

use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use std::fs::File;
use std::process::{Child, Command, Stdio};
use tracing::{debug, info, warn};

/// Names of the FlameGraph toolkit scripts, looked up in
/// `HarnessConfig::flamegraph_dir`.
const STACKCOLLAPSE: &str = "stackcollapse-perf.pl";
const FLAMEGRAPH: &str = "flamegraph.pl";

/// Render the SVG from the recorded profile. Runs the blocking pipeline on
/// the blocking pool.
pub async fn render(cfg: &HarnessConfig) -> Result<()> {
	let cfg = cfg.clone();
	tokio::task::spawn_blocking(move || render_blocking(&cfg))
		.await
		.map_err(|e| Error::process(format!("flamegraph task failed: {e}")))?
}

fn spawn_stage(cmd: &mut Command, stage: &str) -> Result<Child> {
	cmd.spawn().map_err(|e| Error::process(format!("failed to spawn {stage}: {e}")))
}

fn render_blocking(cfg: &HarnessConfig) -> Result<()> {
	let collapse_script = cfg.flamegraph_dir.join(STACKCOLLAPSE);
	let render_script = cfg.flamegraph_dir.join(FLAMEGRAPH);
	let svg = File::create(&cfg.svg)?;

	let mut script = spawn_stage(
		Command::new(&cfg.perf_bin)
			.arg("script")
			.arg("-i")
			.arg(&cfg.perf_data)
			.stdout(Stdio::piped())
			.stderr(Stdio::null()),
		"perf script",
	)?;
	let script_out = script
		.stdout
		.take()
		.ok_or_else(|| Error::process("perf script stdout unavailable"))?;

	let mut collapse = spawn_stage(
		Command::new(&collapse_script)
			.stdin(Stdio::from(script_out))
			.stdout(Stdio::piped())
			.stderr(Stdio::null()),
		"stackcollapse",
	)?;
	let collapse_out = collapse
		.stdout
		.take()
		.ok_or_else(|| Error::process("stackcollapse stdout unavailable"))?;

	let mut renderer = spawn_stage(
		Command::new(&render_script)
			.stdin(Stdio::from(collapse_out))
			.stdout(Stdio::from(svg))
			.stderr(Stdio::null()),
		"flamegraph",
	)?;

	// Drain the pipeline front to back. Statuses are informational only.
	for (stage, child) in [
		("perf script", &mut script),
		("stackcollapse", &mut collapse),
		("flamegraph", &mut renderer),
	] {
		match child.wait() {
			Ok(status) if status.success() => debug!(stage, "stage finished"),
			Ok(status) => warn!(stage, %status, "stage exited with failure"),
			Err(e) => warn!(stage, "failed to wait for stage: {e}"),
		}
	}

	info!(svg = %cfg.svg.display(), "flamegraph written");
	Ok(())
}
