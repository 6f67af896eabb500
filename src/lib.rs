// src/lib.rs

//! Virtual host discovery.
//!
//! Sends requests to target IPs with guessed `Host` headers and reports the
//! hostnames whose responses differ from the one served for a random,
//! unregistered name.

pub mod core;
pub mod logging;

pub use crate::core::models::{CompareMode, Options, Outcome, ProbeResult, RunStats, Verdict};
pub use crate::core::scanner::VhostScanner;
