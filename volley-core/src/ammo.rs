//! The ammunition belt and its trigger sequence.
//!
//! A run always fires the same endpoints in the same pseudo-random order:
//! the trigger sequence draws from a seeded generator, so two runs with the
//! same seed hit the belt in an identical order.

use crate::error::{Error, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// The two map-API endpoints the harness was built to measure.
pub const DEFAULT_AMMUNITION: [&str; 2] = ["/api/v1/maps/map1", "/api/v1/maps"];

/// Ordered, non-empty list of request paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ammunition {
	belt: Vec<String>,
}

impl Ammunition {
	/// Build a belt from request paths. Fails on an empty list.
	pub fn new(paths: Vec<String>) -> Result<Self> {
		if paths.is_empty() {
			return Err(Error::config("ammunition list is empty"));
		}
		Ok(Self { belt: paths })
	}

	pub fn len(&self) -> usize {
		self.belt.len()
	}

	/// Always false; the constructor rejects empty belts.
	pub fn is_empty(&self) -> bool {
		self.belt.is_empty()
	}

	/// Request path at `index`.
	pub fn path(&self, index: usize) -> &str {
		&self.belt[index]
	}

	/// Full URL for the shot: `http://<target><path>`.
	pub fn url(&self, target: &str, index: usize) -> String {
		format!("http://{}{}", target, self.belt[index])
	}
}

impl Default for Ammunition {
	fn default() -> Self {
		Self { belt: DEFAULT_AMMUNITION.iter().map(|s| s.to_string()).collect() }
	}
}

/// Seeded source of ammunition indexes.
///
/// Each draw takes a raw value in `0..random_limit` and reduces it modulo
/// the belt length, so every produced index is in bounds.
#[derive(Debug)]
pub struct TriggerSequence {
	rng: StdRng,
	random_limit: u32,
	belt_len: usize,
}

impl TriggerSequence {
	pub fn new(seed: u64, random_limit: u32, belt_len: usize) -> Self {
		debug_assert!(random_limit > 0);
		debug_assert!(belt_len > 0);
		Self { rng: StdRng::seed_from_u64(seed), random_limit, belt_len }
	}

	/// Next ammunition index.
	pub fn next_index(&mut self) -> usize {
		let raw = self.rng.gen_range(0..self.random_limit) as usize;
		raw % self.belt_len
	}
}
