//! Core pieces of the volley profiling harness: configuration, the
//! ammunition belt and its seeded trigger sequence, child process control
//! for the server under test and the attached profiler, the request loop,
//! and the flamegraph rendering pipeline.

#![forbid(unsafe_code)]

pub mod ammo;
pub mod config;
pub mod error;
pub mod flamegraph;
pub mod process;
pub mod shooter;

pub use ammo::{Ammunition, TriggerSequence};
pub use config::HarnessConfig;
pub use error::{Error, Result};
pub use shooter::ShotReport;
