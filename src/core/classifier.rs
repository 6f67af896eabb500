// src/core/classifier.rs

use crate::core::error::{ProbeError, ScanError};
use crate::core::fuzzer::Fuzzer;
use crate::core::models::{
    CompareMode, Comparison, Job, Options, Outcome, ProbeResult, ResponseKey, Verdict,
};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether two responses are distinguishable.
///
/// A comparator reduces each response to a `ResponseKey`; responses differ
/// when their keys differ. Byte-identical responses always share a key.
pub trait ResponseComparator: Send + Sync {
    fn name(&self) -> &'static str;

    fn key(&self, result: &ProbeResult) -> ResponseKey;

    fn differs(&self, a: &ProbeResult, b: &ProbeResult) -> bool {
        self.key(a) != self.key(b)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Status code or measured body length.
pub struct StatusLength;

impl ResponseComparator for StatusLength {
    fn name(&self) -> &'static str {
        "status-length"
    }

    fn key(&self, result: &ProbeResult) -> ResponseKey {
        ResponseKey {
            status: result.status,
            content_length: Some(result.content_length),
            fingerprint: None,
        }
    }
}

/// Status code or SHA-256 of the raw body.
pub struct BodyHash;

impl ResponseComparator for BodyHash {
    fn name(&self) -> &'static str {
        "body-hash"
    }

    fn key(&self, result: &ProbeResult) -> ResponseKey {
        ResponseKey {
            status: result.status,
            content_length: None,
            fingerprint: Some(result.body_digest()),
        }
    }
}

// Fragments that change between otherwise identical responses.
static RE_ISO_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:?\d{2})?").unwrap()
});
static RE_HTTP_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Mon|Tue|Wed|Thu|Fri|Sat|Sun), \d{2} [A-Z][a-z]{2} \d{4} \d{2}:\d{2}:\d{2} GMT").unwrap()
});
static RE_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}").unwrap()
});
static RE_EPOCH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b1\d{9}(\d{3})?\b").unwrap());

static DYNAMIC_PATTERNS: &[&Lazy<Regex>] = &[&RE_ISO_TIMESTAMP, &RE_HTTP_DATE, &RE_UUID, &RE_EPOCH];

// Only runs holding a digit count as tokens, so words like "deadbeefcafe..."
// or padding such as "aaaa..." survive.
static RE_HEX_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9a-fA-F]{16,}\b").unwrap());

fn strip_hex_tokens(text: &str) -> String {
    RE_HEX_RUN
        .replace_all(text, |caps: &regex::Captures| {
            let run = &caps[0];
            if run.bytes().any(|b| b.is_ascii_digit()) {
                String::new()
            } else {
                run.to_string()
            }
        })
        .into_owned()
}

/// Status code or SHA-256 of the body after removing dynamic fragments.
pub struct Normalized {
    extra: Vec<Regex>,
}

impl Normalized {
    pub fn new(ignore_patterns: &[String]) -> Result<Self, ScanError> {
        let extra = ignore_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { extra })
    }

    fn normalize(&self, result: &ProbeResult) -> String {
        let mut text = result.body_text().into_owned();
        for re in DYNAMIC_PATTERNS.iter().map(|re| &***re) {
            text = re.replace_all(&text, "").into_owned();
        }
        text = strip_hex_tokens(&text);
        for re in &self.extra {
            text = re.replace_all(&text, "").into_owned();
        }
        text
    }
}

impl ResponseComparator for Normalized {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn key(&self, result: &ProbeResult) -> ResponseKey {
        ResponseKey {
            status: result.status,
            content_length: None,
            fingerprint: Some(sha256_hex(self.normalize(result).as_bytes())),
        }
    }
}

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Status code, measured body length or HTML page title.
pub struct Title;

impl Title {
    fn title(result: &ProbeResult) -> Option<String> {
        let document = Html::parse_document(&result.body_text());
        document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }
}

impl ResponseComparator for Title {
    fn name(&self) -> &'static str {
        "title"
    }

    fn key(&self, result: &ProbeResult) -> ResponseKey {
        ResponseKey {
            status: result.status,
            content_length: Some(result.content_length),
            fingerprint: Title::title(result),
        }
    }
}

/// Builds the comparator for a `CompareMode`.
pub fn comparator_for(
    mode: CompareMode,
    ignore_patterns: &[String],
) -> Result<Arc<dyn ResponseComparator>, ScanError> {
    Ok(match mode {
        CompareMode::StatusLength => Arc::new(StatusLength),
        CompareMode::BodyHash => Arc::new(BodyHash),
        CompareMode::Normalized => Arc::new(Normalized::new(ignore_patterns)?),
        CompareMode::Title => Arc::new(Title),
    })
}

/// Turns a candidate response into a verdict.
///
/// The first stage (`compare`) is pure. The optional second stage
/// (`verify`) re-probes the candidate's public endpoint and refines a
/// `Different` result into `Confirmed` or `LikelyFalsePositive`.
#[derive(Clone)]
pub struct Classifier {
    comparator: Arc<dyn ResponseComparator>,
    verify: bool,
}

impl Classifier {
    pub fn new(comparator: Arc<dyn ResponseComparator>, verify: bool) -> Self {
        Self { comparator, verify }
    }

    pub fn from_options(options: &Options) -> Result<Self, ScanError> {
        Ok(Self::new(
            comparator_for(options.compare, &options.ignore_patterns)?,
            options.verify,
        ))
    }

    pub fn comparator_name(&self) -> &'static str {
        self.comparator.name()
    }

    /// Reduces a response to what the configured comparator looks at.
    pub fn key(&self, result: &ProbeResult) -> ResponseKey {
        self.comparator.key(result)
    }

    pub fn compare(&self, baseline: &ProbeResult, candidate: &ProbeResult) -> Comparison {
        self.compare_key(&self.key(baseline), candidate)
    }

    /// Same as `compare`, against a baseline already reduced with `key`.
    pub fn compare_key(&self, baseline: &ResponseKey, candidate: &ProbeResult) -> Comparison {
        if *baseline != self.key(candidate) {
            Comparison::Different
        } else {
            Comparison::Same
        }
    }

    /// Cross-checks a candidate that differs from its baseline against the
    /// response served by the candidate's public address.
    pub async fn verify(
        &self,
        fuzzer: &dyn Fuzzer,
        domain: &str,
        path: &str,
        candidate: &ProbeResult,
    ) -> (Verdict, Option<String>) {
        match fuzzer.probe_public(domain, path).await {
            Ok(public) if self.comparator.differs(candidate, &public) => {
                debug!(domain, path, "Differs from public response.");
                (Verdict::Confirmed, None)
            }
            Ok(public) => {
                debug!(domain, path, public_status = public.status, "Matches public response.");
                (
                    Verdict::LikelyFalsePositive,
                    Some("different than the baseline, but not different than the public facing domain".to_string()),
                )
            }
            Err(ProbeError::Unresolvable { .. }) => {
                (Verdict::Confirmed, Some("no public DNS record".to_string()))
            }
            Err(e) => {
                warn!(domain, path, error = %e, "Public verification failed.");
                (Verdict::Unverified, Some(format!("verify failed: {}", e)))
            }
        }
    }

    /// Classifies the outcome of one job's probe.
    pub async fn classify(
        &self,
        fuzzer: &dyn Fuzzer,
        job: &Job,
        probe: Result<ProbeResult, ProbeError>,
    ) -> Outcome {
        let candidate = match probe {
            Ok(candidate) => candidate,
            Err(e) => {
                let mut outcome = Outcome::from_job(job, Verdict::Error).with_note(e.to_string());
                outcome.status = e.status();
                return outcome;
            }
        };

        match self.compare_key(&job.baseline_key, &candidate) {
            Comparison::Same => Outcome::from_job(job, Verdict::Same).with_response(&candidate),
            Comparison::Different if self.verify => {
                let (verdict, note) = self.verify(fuzzer, &job.domain, &job.path, &candidate).await;
                let mut outcome = Outcome::from_job(job, verdict).with_response(&candidate);
                outcome.note = note;
                outcome
            }
            Comparison::Different => Outcome::from_job(job, Verdict::Confirmed).with_response(&candidate),
        }
    }
}
