//! Harness configuration.
//!
//! Every knob the measurement run depends on lives here, with the classic
//! defaults: 100 shots at `localhost:8080`, a 100 ms cooldown, seed
//! `123456789`, raw draws in `0..1000`, `perf.data` and `graph.svg` in the
//! working directory. Resolution order is defaults, then a TOML file
//! (`[harness]` table), then `VOLLEY_*` environment variables, then CLI
//! flags applied by the binary.

use crate::ammo;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{
	fs,
	path::{Path, PathBuf},
	time::Duration,
};

/// Configuration for one measurement run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HarnessConfig {
	/// Host:port the ammunition is aimed at.
	pub target: String,
	/// Request paths fired at the target, in belt order.
	pub ammunition: Vec<String>,
	/// Number of shots to fire.
	pub shot_count: u32,
	/// Cooldown between shots, milliseconds.
	pub cooldown_ms: u64,
	/// Seed for the trigger sequence.
	pub seed: u64,
	/// Upper bound of the raw random draw; the draw is taken modulo the
	/// ammunition count.
	pub random_limit: u32,
	/// Sampling profiler binary.
	pub perf_bin: String,
	/// Raw profile output path.
	pub perf_data: PathBuf,
	/// Rendered flamegraph output path.
	pub svg: PathBuf,
	/// Directory holding `stackcollapse-perf.pl` and `flamegraph.pl`.
	pub flamegraph_dir: PathBuf,
	/// How long to poll the target for TCP readiness before shooting anyway.
	pub ready_timeout_ms: u64,
}

impl Default for HarnessConfig {
	fn default() -> Self {
		Self {
			target: "localhost:8080".into(),
			ammunition: ammo::DEFAULT_AMMUNITION.iter().map(|s| s.to_string()).collect(),
			shot_count: 100,
			cooldown_ms: 100,
			seed: 123_456_789,
			random_limit: 1000,
			perf_bin: "perf".into(),
			perf_data: PathBuf::from("perf.data"),
			svg: PathBuf::from("graph.svg"),
			flamegraph_dir: PathBuf::from("./FlameGraph"),
			ready_timeout_ms: 10_000,
		}
	}
}

/// Shape of the config file; harness settings live under `[harness]`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
	#[serde(default)]
	harness: Option<HarnessConfig>,
}

impl HarnessConfig {
	/// Load configuration from a TOML file with a `[harness]` table.
	/// A file without the table yields the defaults.
	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let data = fs::read_to_string(path)?;
		Self::from_toml_str(&data)
	}

	/// Parse configuration from TOML text.
	pub fn from_toml_str(data: &str) -> Result<Self> {
		let file: ConfigFile =
			toml::from_str(data).map_err(|e| Error::config(format!("toml parse error: {e}")))?;
		Ok(file.harness.unwrap_or_default())
	}

	/// Override fields from `VOLLEY_*` environment variables. Unparseable
	/// values are ignored, matching the tolerant posture of the harness.
	pub fn apply_env(&mut self) {
		if let Ok(v) = std::env::var("VOLLEY_TARGET") {
			let v = v.trim();
			if !v.is_empty() { self.target = v.to_string(); }
		}
		if let Ok(v) = std::env::var("VOLLEY_SHOT_COUNT") {
			if let Ok(n) = v.trim().parse() { self.shot_count = n; }
		}
		if let Ok(v) = std::env::var("VOLLEY_COOLDOWN_MS") {
			if let Ok(n) = v.trim().parse() { self.cooldown_ms = n; }
		}
		if let Ok(v) = std::env::var("VOLLEY_SEED") {
			if let Ok(n) = v.trim().parse() { self.seed = n; }
		}
		if let Ok(v) = std::env::var("VOLLEY_RANDOM_LIMIT") {
			if let Ok(n) = v.trim().parse() { self.random_limit = n; }
		}
		if let Ok(v) = std::env::var("VOLLEY_PERF_BIN") {
			let v = v.trim();
			if !v.is_empty() { self.perf_bin = v.to_string(); }
		}
		if let Ok(v) = std::env::var("VOLLEY_PERF_DATA") {
			let v = v.trim();
			if !v.is_empty() { self.perf_data = PathBuf::from(v); }
		}
		if let Ok(v) = std::env::var("VOLLEY_SVG") {
			let v = v.trim();
			if !v.is_empty() { self.svg = PathBuf::from(v); }
		}
		if let Ok(v) = std::env::var("VOLLEY_FLAMEGRAPH_DIR") {
			let v = v.trim();
			if !v.is_empty() { self.flamegraph_dir = PathBuf::from(v); }
		}
		if let Ok(v) = std::env::var("VOLLEY_READY_TIMEOUT_MS") {
			if let Ok(n) = v.trim().parse() { self.ready_timeout_ms = n; }
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.ammunition.is_empty() {
			return Err(Error::config("ammunition list is empty"));
		}
		if self.shot_count == 0 {
			return Err(Error::config("shot_count must be positive"));
		}
		if self.random_limit == 0 {
			return Err(Error::config("random_limit must be positive"));
		}
		if self.target.trim().is_empty() {
			return Err(Error::config("target must not be empty"));
		}
		Ok(())
	}

	pub fn cooldown(&self) -> Duration {
		Duration::from_millis(self.cooldown_ms)
	}

	pub fn ready_timeout(&self) -> Duration {
		Duration::from_millis(self.ready_timeout_ms)
	}
}
