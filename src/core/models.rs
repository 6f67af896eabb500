// src/core/models.rs

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};

// --- Run Configuration ---

/// Selects which response fields decide whether a candidate differs from its baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    /// Status code or content length.
    #[default]
    StatusLength,
    /// Status code or SHA-256 of the raw body.
    BodyHash,
    /// Status code or SHA-256 of the body with dynamic fragments stripped.
    Normalized,
    /// Status code or the HTML `<title>`.
    Title,
}

/// Immutable parameters of one enumeration run.
///
/// Built once by the front end and shared read-only (behind an `Arc`) with the
/// orchestrator, the workers and the HTTP fuzzer.
#[derive(Debug, Clone)]
pub struct Options {
    /// Suffixes appended to every wordlist entry. Empty means the wordlist holds full hostnames.
    pub domains: Vec<String>,
    /// Extra request headers in `Name: value` form.
    pub headers: Vec<String>,
    pub ips: Vec<String>,
    pub paths: Vec<String>,
    /// Explicit port; `None` picks 443 or 80 from `tls`.
    pub port: Option<u16>,
    pub proxy: Option<String>,
    pub threads: usize,
    pub timeout: Duration,
    pub tls: bool,
    pub verbose: bool,
    pub verify: bool,
    pub wordlist: Vec<String>,
    pub compare: CompareMode,
    /// Extra regexes removed from bodies before `CompareMode::Normalized` hashing.
    pub ignore_patterns: Vec<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            domains: Vec::new(),
            headers: Vec::new(),
            ips: Vec::new(),
            paths: vec!["/".to_string()],
            port: None,
            proxy: None,
            threads: 10,
            timeout: Duration::from_secs(5),
            tls: false,
            verbose: false,
            verify: false,
            wordlist: Vec::new(),
            compare: CompareMode::default(),
            ignore_patterns: Vec::new(),
        }
    }
}

impl Options {
    pub fn scheme(&self) -> &'static str {
        if self.tls { "https" } else { "http" }
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.tls { 443 } else { 80 })
    }
}

// --- Probe Results ---

/// One HTTP response as seen by the scanner.
///
/// `content_length` is the length of the body actually received, not the
/// `Content-Length` header, so chunked responses compare the same way as
/// fixed-length ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub status: u16,
    pub content_length: u64,
    pub body: Bytes,
    pub headers: HeaderMap,
}

impl ProbeResult {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            content_length: body.len() as u64,
            body,
            headers: HeaderMap::new(),
        }
    }

    /// Hex encoded SHA-256 of the raw body.
    pub fn body_digest(&self) -> String {
        hex::encode(Sha256::digest(&self.body))
    }

    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

// --- Jobs ---

/// The parts of a response one comparator looks at. Two responses are the
/// same under that comparator exactly when their keys are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseKey {
    pub status: u16,
    pub content_length: Option<u64>,
    pub fingerprint: Option<String>,
}

/// A single candidate to test against the baseline of its (ip, path) pair.
///
/// `baseline_key` is derived once per pair and shared like the baseline.
#[derive(Debug, Clone)]
pub struct Job {
    pub baseline: Arc<ProbeResult>,
    pub baseline_key: Arc<ResponseKey>,
    pub domain: String,
    pub ip: String,
    pub path: String,
}

// --- Classification ---

/// Result of the pure comparison stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Different,
    Same,
}

/// Terminal verdict of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Differs from the baseline and, in verify mode, from the public response too.
    Confirmed,
    /// Differs from the baseline but matches what the public hostname serves.
    LikelyFalsePositive,
    /// Differs from the baseline; the public cross-check could not be completed.
    Unverified,
    /// Indistinguishable from the baseline.
    Same,
    /// The candidate probe itself failed.
    Error,
}

impl Verdict {
    /// Console marker used by the plain-text sink and the dashboard.
    pub fn marker(&self) -> &'static str {
        match self {
            Verdict::Confirmed => "[+]",
            Verdict::LikelyFalsePositive | Verdict::Same => "[-]",
            Verdict::Unverified => "[?]",
            Verdict::Error => "[!]",
        }
    }
}

// --- Reporting Records ---

/// One reported job outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub ip: String,
    pub path: String,
    pub domain: String,
    pub status: Option<u16>,
    pub content_length: Option<u64>,
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Outcome {
    pub fn from_job(job: &Job, verdict: Verdict) -> Self {
        Self {
            ip: job.ip.clone(),
            path: job.path.clone(),
            domain: job.domain.clone(),
            status: None,
            content_length: None,
            verdict,
            note: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_response(mut self, result: &ProbeResult) -> Self {
        self.status = Some(result.status);
        self.content_length = Some(result.content_length);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Emitted once per (ip, path) pair after its baseline probe.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineReport {
    pub ip: String,
    pub path: String,
    pub status: Option<u16>,
    pub content_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Jobs enqueued for this pair; zero when the baseline failed.
    pub jobs: usize,
}

impl BaselineReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub pairs: usize,
    pub baselines_failed: usize,
    pub enqueued: usize,
    pub completed: usize,
    pub confirmed: usize,
    pub likely_false_positive: usize,
    pub unverified: usize,
    pub same: usize,
    pub errors: usize,
}

impl RunStats {
    /// Counts one terminal verdict.
    pub fn observe(&mut self, verdict: Verdict) {
        self.completed += 1;
        match verdict {
            Verdict::Confirmed => self.confirmed += 1,
            Verdict::LikelyFalsePositive => self.likely_false_positive += 1,
            Verdict::Unverified => self.unverified += 1,
            Verdict::Same => self.same += 1,
            Verdict::Error => self.errors += 1,
        }
    }

    /// Adds the per-verdict counters of a worker tally.
    pub fn merge(&mut self, other: &RunStats) {
        self.completed += other.completed;
        self.confirmed += other.confirmed;
        self.likely_false_positive += other.likely_false_positive;
        self.unverified += other.unverified;
        self.same += other.same;
        self.errors += other.errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn compare_mode_parses_kebab_case() {
        assert_eq!(CompareMode::from_str("body-hash").unwrap(), CompareMode::BodyHash);
        assert_eq!(CompareMode::from_str("status-length").unwrap(), CompareMode::StatusLength);
        assert!(CompareMode::from_str("fuzzy").is_err());
        assert_eq!(CompareMode::Normalized.to_string(), "normalized");
    }

    #[test]
    fn effective_port_follows_tls() {
        let mut options = Options::default();
        assert_eq!(options.effective_port(), 80);
        options.tls = true;
        assert_eq!(options.effective_port(), 443);
        options.port = Some(8443);
        assert_eq!(options.effective_port(), 8443);
        assert_eq!(options.scheme(), "https");
    }

    #[test]
    fn probe_result_measures_body() {
        let result = ProbeResult::new(200, "hello");
        assert_eq!(result.content_length, 5);
        assert_eq!(
            result.body_digest(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn stats_observe_and_merge() {
        let mut a = RunStats::default();
        a.observe(Verdict::Confirmed);
        a.observe(Verdict::Same);
        let mut b = RunStats::default();
        b.observe(Verdict::Error);
        a.merge(&b);
        assert_eq!(a.completed, 3);
        assert_eq!(a.confirmed, 1);
        assert_eq!(a.same, 1);
        assert_eq!(a.errors, 1);
    }
}
