//! The request loop.
//!
//! Fires the configured number of shots at the target, one at a time, with
//! a fixed cooldown after each. Shot outcomes are logged and otherwise
//! ignored; a failed request never aborts the volley.

use crate::ammo::{Ammunition, TriggerSequence};
use crate::config::HarnessConfig;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Summary of a completed volley.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShotReport {
	/// Shots fired (always equals the configured shot count).
	pub fired: u32,
	/// Shots that came back with a successful response, per belt index.
	pub hits: Vec<u64>,
}

impl ShotReport {
	/// Total successful responses across the belt.
	pub fn total_hits(&self) -> u64 {
		self.hits.iter().sum()
	}
}

fn agent() -> ureq::Agent {
	// ureq is blocking; conservative timeouts keep a wedged server from
	// stalling the whole volley.
	ureq::AgentBuilder::new()
		.timeout_connect(Duration::from_secs(3))
		.timeout(Duration::from_secs(8))
		.build()
}

/// Issue one blocking GET and drain the body. The body itself is discarded.
fn fire_one(agent: &ureq::Agent, url: &str) -> std::result::Result<u16, ureq::Error> {
	let resp = agent.get(url).call()?;
	let status = resp.status();
	let _ = resp.into_string();
	Ok(status)
}

/// Run the full volley: `shot_count` seeded-random picks from the belt,
/// one GET per pick, cooldown sleep after every shot.
pub async fn fire_all(cfg: &HarnessConfig, ammo: &Ammunition) -> Result<ShotReport> {
	let mut sequence = TriggerSequence::new(cfg.seed, cfg.random_limit, ammo.len());
	let agent = Arc::new(agent());
	let cooldown = cfg.cooldown();
	let mut hits = vec![0u64; ammo.len()];

	for shot in 0..cfg.shot_count {
		let index = sequence.next_index();
		let url = ammo.url(&cfg.target, index);
		let agent = Arc::clone(&agent);
		let target = url.clone();
		let outcome = tokio::task::spawn_blocking(move || fire_one(&agent, &target))
			.await
			.map_err(|e| Error::http(format!("shot task failed: {e}")))?;
		match outcome {
			Ok(status) => {
				hits[index] += 1;
				debug!(shot, index, status, %url, "shot landed");
			}
			Err(e) => warn!(shot, index, %url, "shot missed: {e}"),
		}
		tokio::time::sleep(cooldown).await;
	}

	println!("Shooting complete");
	Ok(ShotReport { fired: cfg.shot_count, hits })
}
