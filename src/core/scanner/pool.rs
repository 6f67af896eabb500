// src/core/scanner/pool.rs

use crate::core::classifier::Classifier;
use crate::core::error::ScanError;
use crate::core::fuzzer::Fuzzer;
use crate::core::models::{Job, RunStats, Verdict};
use crate::core::report::ReportSink;
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Completion barrier: one `add` per enqueued job, one `done` per finished
/// job, `wait` resolves once the count is back to zero.
#[derive(Clone, Default)]
pub struct WaitGroup {
    inner: Arc<WaitGroupInner>,
}

#[derive(Default)]
struct WaitGroupInner {
    count: AtomicUsize,
    notify: Notify,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, n: usize) {
        self.inner.count.fetch_add(n, Ordering::AcqRel);
    }

    pub fn done(&self) {
        if self.inner.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    pub async fn wait(&self) {
        loop {
            // Register before checking so a concurrent `done` cannot be missed.
            let notified = self.inner.notify.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Marks a job done however the worker leaves it.
struct DoneGuard<'a>(&'a WaitGroup);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.done();
    }
}

/// Everything a worker shares read-only with the others.
pub struct WorkerContext {
    pub fuzzer: Arc<dyn Fuzzer>,
    pub classifier: Classifier,
    pub sink: Arc<dyn ReportSink>,
    pub verbose: bool,
}

type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Fixed set of long-lived workers draining a bounded job queue.
///
/// The queue holds at most as many jobs as there are workers, so `submit`
/// waits whenever the workers are saturated.
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<RunStats>>,
    wait_group: WaitGroup,
}

impl WorkerPool {
    pub fn spawn(size: usize, context: Arc<WorkerContext>) -> Result<Self, ScanError> {
        if size == 0 {
            return Err(ScanError::NoWorkers);
        }

        let (sender, receiver) = mpsc::channel(size);
        let queue: JobQueue = Arc::new(Mutex::new(receiver));
        let wait_group = WaitGroup::new();

        let workers = (0..size)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    Arc::clone(&context),
                    Arc::clone(&queue),
                    wait_group.clone(),
                ))
            })
            .collect();

        debug!(workers = size, "Worker pool started.");
        Ok(Self { sender, workers, wait_group })
    }

    /// Enqueues a job, waiting for room. Returns `false` if no worker is left to take it.
    pub async fn submit(&self, job: Job) -> bool {
        self.wait_group.add(1);
        if self.sender.send(job).await.is_err() {
            warn!("Job queue closed, dropping job.");
            self.wait_group.done();
            return false;
        }
        true
    }

    /// Waits for every submitted job, closes the queue and collects the
    /// workers' tallies.
    pub async fn join(self) -> Result<RunStats, ScanError> {
        self.wait_group.wait().await;
        drop(self.sender);

        let mut stats = RunStats::default();
        for tally in join_all(self.workers).await {
            stats.merge(&tally?);
        }
        Ok(stats)
    }
}

async fn run_worker(
    id: usize,
    context: Arc<WorkerContext>,
    queue: JobQueue,
    wait_group: WaitGroup,
) -> RunStats {
    let mut tally = RunStats::default();

    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else { break };
        let _done = DoneGuard(&wait_group);

        let probe = context.fuzzer.probe(&job.ip, &job.domain, &job.path).await;
        let outcome = context
            .classifier
            .classify(context.fuzzer.as_ref(), &job, probe)
            .await;

        tally.observe(outcome.verdict);
        context.sink.job_done(outcome.verdict);
        if outcome.verdict != Verdict::Same || context.verbose {
            context.sink.record(&outcome);
        }
    }

    debug!(worker = id, completed = tally.completed, "Worker finished.");
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_group_waits_for_all_done() {
        let wg = WaitGroup::new();
        wg.add(3);

        for delay in [5u64, 10, 15] {
            let wg = wg.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                wg.done();
            });
        }

        tokio::time::timeout(Duration::from_secs(2), wg.wait())
            .await
            .expect("wait group never released");
        assert_eq!(wg.pending(), 0);
    }

    #[tokio::test]
    async fn empty_wait_group_returns_immediately() {
        WaitGroup::new().wait().await;
    }
}
