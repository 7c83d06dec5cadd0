//! `volley` binary: launches the server under test, attaches `perf` to it,
//! fires the configured volley of HTTP requests, and renders a flamegraph
//! from the recorded samples.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use volley_core::{
	flamegraph,
	process::{ProfilerHandle, ServerHandle},
	shooter, Ammunition, HarnessConfig,
};

#[derive(Debug, Parser)]
#[command(
	name = "volley",
	version,
	about = "Profiles a server under a fixed volley of HTTP requests and renders a flamegraph"
)]
struct Cli {
	/// Path to a TOML config file with a [harness] table
	#[arg(long)]
	config: Option<PathBuf>,
	/// Host:port the requests are aimed at
	#[arg(long)]
	target: Option<String>,
	/// Number of shots to fire
	#[arg(long)]
	shots: Option<u32>,
	/// Cooldown between shots, in milliseconds
	#[arg(long)]
	cooldown_ms: Option<u64>,
	/// Seed for the trigger sequence
	#[arg(long)]
	seed: Option<u64>,
	/// Upper bound of the raw random draw (taken modulo the endpoint count)
	#[arg(long)]
	random_limit: Option<u32>,
	/// Sampling profiler binary
	#[arg(long)]
	perf_bin: Option<String>,
	/// Raw profile output path
	#[arg(long)]
	perf_data: Option<PathBuf>,
	/// Rendered flamegraph output path
	#[arg(long)]
	svg: Option<PathBuf>,
	/// Directory containing stackcollapse-perf.pl and flamegraph.pl
	#[arg(long)]
	flamegraph_dir: Option<PathBuf>,
	/// Server command to launch and profile
	#[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
	server: Vec<String>,
}

fn resolve_config(cli: &Cli) -> anyhow::Result<HarnessConfig> {
	let file = cli
		.config
		.clone()
		.or_else(|| std::env::var("VOLLEY_CONFIG").ok().filter(|p| !p.trim().is_empty()).map(PathBuf::from));
	let mut cfg = match file {
		Some(path) => HarnessConfig::load_from_file(&path)
			.with_context(|| format!("failed to load config {}", path.display()))?,
		None => HarnessConfig::default(),
	};
	cfg.apply_env();
	if let Some(v) = &cli.target { cfg.target = v.clone(); }
	if let Some(v) = cli.shots { cfg.shot_count = v; }
	if let Some(v) = cli.cooldown_ms { cfg.cooldown_ms = v; }
	if let Some(v) = cli.seed { cfg.seed = v; }
	if let Some(v) = cli.random_limit { cfg.random_limit = v; }
	if let Some(v) = &cli.perf_bin { cfg.perf_bin = v.clone(); }
	if let Some(v) = &cli.perf_data { cfg.perf_data = v.clone(); }
	if let Some(v) = &cli.svg { cfg.svg = v.clone(); }
	if let Some(v) = &cli.flamegraph_dir { cfg.flamegraph_dir = v.clone(); }
	cfg.validate()?;
	Ok(cfg)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
	// tracing init (env controlled)
	if std::env::var("RUST_LOG").is_err() {
		std::env::set_var("RUST_LOG", "info");
	}
	tracing_subscriber::fmt::init();

	let cli = Cli::parse();
	let cfg = resolve_config(&cli)?;
	let ammo = Ammunition::new(cfg.ammunition.clone())?;

	let server = ServerHandle::spawn(&cli.server).context("failed to start the server")?;
	if !server.wait_ready(&cfg.target, cfg.ready_timeout()).await {
		warn!(target = %cfg.target, "server never accepted a connection, shooting anyway");
	}

	let profiler = ProfilerHandle::attach(server.pid(), &cfg.perf_bin, &cfg.perf_data)
		.context("failed to attach the profiler")?;

	let report = shooter::fire_all(&cfg, &ammo).await?;
	info!(fired = report.fired, hits = report.total_hits(), "volley finished");

	// Profiler first so it flushes perf.data before the pipeline reads it;
	// the server is only reaped on a best-effort basis.
	profiler.stop().await.context("profiler did not stop cleanly")?;
	if let Err(e) = server.terminate().await {
		warn!("server teardown failed: {e}");
	}

	flamegraph::render(&cfg).await.context("flamegraph pipeline failed")?;

	tokio::time::sleep(Duration::from_secs(1)).await;
	println!("Job done");
	Ok(())
}
