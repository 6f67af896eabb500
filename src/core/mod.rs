// src/core/mod.rs

/// Run options, probe results, jobs, verdicts and reporting records.
pub mod models;

/// Error types for probes and for the scanner.
pub mod error;

/// Wordlist x domain suffix expansion.
pub mod candidates;

/// The `Fuzzer` capability and its `reqwest` implementation.
pub mod fuzzer;

/// Response comparison and the verify stage.
pub mod classifier;

/// Baseline acquisition, the worker pool and the run orchestrator.
pub mod scanner;

/// Reporting sinks.
pub mod report;

/// List file loading.
pub mod input;
