//! Harness error type.

use thiserror::Error;

/// Result alias used across the harness.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors surfaced by the harness library.
#[derive(Debug, Error)]
pub enum Error {
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	#[error("config: {0}")]
	Config(String),
	#[error("process: {0}")]
	Process(String),
	#[error("http: {0}")]
	Http(String),
}

impl Error {
	pub fn config(msg: impl Into<String>) -> Self { Self::Config(msg.into()) }
	pub fn process(msg: impl Into<String>) -> Self { Self::Process(msg.into()) }
	pub fn http(msg: impl Into<String>) -> Self { Self::Http(msg.into()) }
}
