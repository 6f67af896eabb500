// src/core/scanner/mod.rs

pub mod baseline;
pub mod pool;

use crate::core::candidates::permute_domains;
use crate::core::classifier::Classifier;
use crate::core::error::ScanError;
use crate::core::fuzzer::Fuzzer;
use crate::core::models::{BaselineReport, Job, Options, RunStats};
use crate::core::report::ReportSink;
use self::baseline::acquire_baseline;
use self::pool::{WorkerContext, WorkerPool};
use std::sync::Arc;
use tracing::{error, info};

/// Runs one vhost enumeration.
///
/// For every (ip, path) pair a baseline is taken first; pairs whose
/// baseline fails are reported and skipped. Every candidate of a healthy
/// pair becomes a job for the worker pool, and `run` returns once all jobs
/// have a verdict.
pub struct VhostScanner {
    options: Arc<Options>,
    fuzzer: Arc<dyn Fuzzer>,
    sink: Arc<dyn ReportSink>,
    classifier: Classifier,
}

impl VhostScanner {
    pub fn new(
        options: Arc<Options>,
        fuzzer: Arc<dyn Fuzzer>,
        sink: Arc<dyn ReportSink>,
    ) -> Result<Self, ScanError> {
        let classifier = Classifier::from_options(&options)?;
        Ok(Self { options, fuzzer, sink, classifier })
    }

    /// Replaces the classifier built from the options.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub async fn run(&self) -> Result<RunStats, ScanError> {
        let options = &self.options;
        let domains = permute_domains(&options.wordlist, &options.domains);
        info!(
            candidates = domains.len(),
            ips = options.ips.len(),
            paths = options.paths.len(),
            threads = options.threads,
            compare = self.classifier.comparator_name(),
            verify = options.verify,
            "Starting vhost enumeration."
        );

        let pool = WorkerPool::spawn(
            options.threads,
            Arc::new(WorkerContext {
                fuzzer: Arc::clone(&self.fuzzer),
                classifier: self.classifier.clone(),
                sink: Arc::clone(&self.sink),
                verbose: options.verbose,
            }),
        )?;

        let mut stats = RunStats::default();
        for ip in &options.ips {
            for path in &options.paths {
                stats.pairs += 1;

                let baseline = match acquire_baseline(self.fuzzer.as_ref(), ip, path).await {
                    Ok(baseline) => Arc::new(baseline),
                    Err(e) => {
                        error!(ip = %ip, path = %path, error = %e, "Baseline failed, skipping pair.");
                        stats.baselines_failed += 1;
                        self.sink.baseline(&BaselineReport {
                            ip: ip.clone(),
                            path: path.clone(),
                            status: None,
                            content_length: None,
                            error: Some(e.to_string()),
                            jobs: 0,
                        });
                        continue;
                    }
                };

                self.sink.baseline(&BaselineReport {
                    ip: ip.clone(),
                    path: path.clone(),
                    status: Some(baseline.status),
                    content_length: Some(baseline.content_length),
                    error: None,
                    jobs: domains.len(),
                });

                let baseline_key = Arc::new(self.classifier.key(&baseline));
                for domain in &domains {
                    let job = Job {
                        baseline: Arc::clone(&baseline),
                        baseline_key: Arc::clone(&baseline_key),
                        domain: domain.clone(),
                        ip: ip.clone(),
                        path: path.clone(),
                    };
                    if pool.submit(job).await {
                        stats.enqueued += 1;
                    }
                }
            }
        }

        let tally = pool.join().await?;
        stats.merge(&tally);

        info!(
            enqueued = stats.enqueued,
            completed = stats.completed,
            confirmed = stats.confirmed,
            false_positives = stats.likely_false_positive,
            errors = stats.errors,
            baselines_failed = stats.baselines_failed,
            "Vhost enumeration finished."
        );
        Ok(stats)
    }
}
