// src/core/report.rs

use crate::core::models::{BaselineReport, Outcome, RunStats, Verdict};
use serde::Serialize;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

/// Receives the records of a run.
///
/// Called concurrently from every worker.
pub trait ReportSink: Send + Sync {
    fn record(&self, outcome: &Outcome);

    fn baseline(&self, _report: &BaselineReport) {}

    /// Called once per finished job, reported or not.
    fn job_done(&self, _verdict: Verdict) {}
}

/// Everything a run emits, in one stream.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    Baseline(BaselineReport),
    Outcome(Outcome),
    Finished(RunStats),
    Aborted { error: String },
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Plain-text line for an outcome.
pub fn format_outcome(outcome: &Outcome) -> String {
    let prefix = format!(
        "{} [{}] [{}] [{}] [{}] {}",
        outcome.verdict.marker(),
        outcome.ip,
        outcome.path,
        opt(outcome.status),
        opt(outcome.content_length),
        outcome.domain
    );

    match (outcome.verdict, &outcome.note) {
        (Verdict::Same, _) => format!("{} is not different than the baseline", prefix),
        (Verdict::LikelyFalsePositive, _) => format!(
            "{} is different than the baseline, but is not different than public facing domain",
            prefix
        ),
        (Verdict::Error, Some(note)) => format!("{} -> {}", prefix, note),
        (_, Some(note)) => format!("{} ({})", prefix, note),
        (_, None) => prefix,
    }
}

/// Plain-text line for a baseline.
pub fn format_baseline(report: &BaselineReport) -> String {
    match &report.error {
        Some(error) => format!("[!] Failed to obtain baseline ({}{}): {}", report.ip, report.path, error),
        None => format!(
            "[!] Baseline on {}{}: [{}] [{}], testing {} candidates",
            report.ip,
            report.path,
            opt(report.status),
            opt(report.content_length),
            report.jobs
        ),
    }
}

/// Prints one line per record on stdout.
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ReportSink for ConsoleSink {
    fn record(&self, outcome: &Outcome) {
        println!("{}", format_outcome(outcome));
    }

    fn baseline(&self, report: &BaselineReport) {
        if self.verbose || !report.is_ok() {
            println!("{}", format_baseline(report));
        }
    }
}

enum JsonCommand {
    Line(Vec<u8>),
    Flush(oneshot::Sender<()>),
}

/// Writes every event as one JSON object per line.
///
/// Records are encoded on the caller and handed to a single writer task
/// that owns the file, so workers never block on disk I/O.
pub struct JsonLinesSink {
    sender: mpsc::UnboundedSender<JsonCommand>,
}

impl JsonLinesSink {
    /// Creates `path` and starts its writer task. Must run inside a tokio runtime.
    pub async fn create(path: &Path) -> io::Result<Self> {
        let file = File::create(path).await?;
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(write_lines(BufWriter::new(file), receiver));
        Ok(Self { sender })
    }

    pub fn write_event(&self, event: &ScanEvent) {
        let mut line = match serde_json::to_vec(event) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode JSON record.");
                return;
            }
        };
        line.push(b'\n');
        if self.sender.send(JsonCommand::Line(line)).is_err() {
            warn!("JSON writer is gone, dropping record.");
        }
    }

    /// Resolves once every event written so far has reached the file.
    pub async fn flush(&self) {
        let (done, flushed) = oneshot::channel();
        if self.sender.send(JsonCommand::Flush(done)).is_ok() {
            let _ = flushed.await;
        }
    }
}

async fn write_lines(mut writer: BufWriter<File>, mut commands: mpsc::UnboundedReceiver<JsonCommand>) {
    while let Some(command) = commands.recv().await {
        let result = match command {
            JsonCommand::Line(line) => writer.write_all(&line).await,
            JsonCommand::Flush(done) => {
                let result = writer.flush().await;
                let _ = done.send(());
                result
            }
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to write JSON record.");
        }
    }
    if let Err(e) = writer.flush().await {
        warn!(error = %e, "Failed to flush JSON output.");
    }
}

impl ReportSink for JsonLinesSink {
    fn record(&self, outcome: &Outcome) {
        self.write_event(&ScanEvent::Outcome(outcome.clone()));
    }

    fn baseline(&self, report: &BaselineReport) {
        self.write_event(&ScanEvent::Baseline(report.clone()));
    }
}

/// Keeps every record in memory.
#[derive(Default)]
pub struct MemorySink {
    outcomes: Mutex<Vec<Outcome>>,
    baselines: Mutex<Vec<BaselineReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn baselines(&self) -> Vec<BaselineReport> {
        self.baselines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ReportSink for MemorySink {
    fn record(&self, outcome: &Outcome) {
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner()).push(outcome.clone());
    }

    fn baseline(&self, report: &BaselineReport) {
        self.baselines.lock().unwrap_or_else(|e| e.into_inner()).push(report.clone());
    }
}

/// Forwards records to an async consumer such as the dashboard, and counts
/// finished jobs in a shared counter.
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<ScanEvent>,
    completed: Arc<AtomicUsize>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<ScanEvent>, completed: Arc<AtomicUsize>) -> Self {
        Self { sender, completed }
    }
}

impl ReportSink for ChannelSink {
    fn record(&self, outcome: &Outcome) {
        // The receiver only goes away when the user quits.
        let _ = self.sender.send(ScanEvent::Outcome(outcome.clone()));
    }

    fn baseline(&self, report: &BaselineReport) {
        let _ = self.sender.send(ScanEvent::Baseline(report.clone()));
    }

    fn job_done(&self, _verdict: Verdict) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Hands each record to several sinks.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn ReportSink>>) -> Self {
        Self { sinks }
    }
}

impl ReportSink for FanoutSink {
    fn record(&self, outcome: &Outcome) {
        for sink in &self.sinks {
            sink.record(outcome);
        }
    }

    fn baseline(&self, report: &BaselineReport) {
        for sink in &self.sinks {
            sink.baseline(report);
        }
    }

    fn job_done(&self, verdict: Verdict) {
        for sink in &self.sinks {
            sink.job_done(verdict);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn outcome(verdict: Verdict, note: Option<&str>) -> Outcome {
        Outcome {
            ip: "10.0.0.1".into(),
            path: "/".into(),
            domain: "admin.example.com".into(),
            status: Some(200),
            content_length: Some(3000),
            verdict,
            note: note.map(String::from),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn formats_confirmed() {
        assert_eq!(
            format_outcome(&outcome(Verdict::Confirmed, None)),
            "[+] [10.0.0.1] [/] [200] [3000] admin.example.com"
        );
    }

    #[test]
    fn formats_false_positive_and_same() {
        assert!(format_outcome(&outcome(Verdict::LikelyFalsePositive, Some("x")))
            .starts_with("[-] [10.0.0.1] [/] [200] [3000] admin.example.com is different than the baseline"));
        assert!(format_outcome(&outcome(Verdict::Same, None)).ends_with("is not different than the baseline"));
    }

    #[test]
    fn formats_error_with_partial_metadata() {
        let mut o = outcome(Verdict::Error, Some("timed out"));
        o.status = None;
        o.content_length = None;
        assert_eq!(format_outcome(&o), "[!] [10.0.0.1] [/] [-] [-] admin.example.com -> timed out");
    }

    #[tokio::test]
    async fn json_lines_are_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let sink = JsonLinesSink::create(&path).await.unwrap();
        sink.record(&outcome(Verdict::Confirmed, None));
        sink.write_event(&ScanEvent::Finished(RunStats::default()));
        sink.flush().await;

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> =
            text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "outcome");
        assert_eq!(lines[0]["verdict"], "confirmed");
        assert_eq!(lines[0]["domain"], "admin.example.com");
        assert_eq!(lines[1]["event"], "finished");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn json_lines_from_many_tasks_stay_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let sink = Arc::new(JsonLinesSink::create(&path).await.unwrap());

        let writers: Vec<_> = (0..8)
            .map(|_| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    for _ in 0..25 {
                        sink.record(&outcome(Verdict::Confirmed, None));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }
        sink.flush().await;

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 200);
        for line in text.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["event"], "outcome");
        }
    }

    #[test]
    fn fanout_reaches_every_sink() {
        let a = Arc::new(MemorySink::new());
        let b = Arc::new(MemorySink::new());
        let fanout = FanoutSink::new(vec![a.clone() as Arc<dyn ReportSink>, b.clone()]);
        fanout.record(&outcome(Verdict::Confirmed, None));
        assert_eq!(a.outcomes().len(), 1);
        assert_eq!(b.outcomes().len(), 1);
    }

    #[tokio::test]
    async fn channel_sink_forwards_and_counts() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let completed = Arc::new(AtomicUsize::new(0));
        let sink = ChannelSink::new(tx, completed.clone());

        sink.record(&outcome(Verdict::Confirmed, None));
        sink.job_done(Verdict::Confirmed);
        sink.job_done(Verdict::Same);

        assert!(matches!(rx.recv().await, Some(ScanEvent::Outcome(o)) if o.domain == "admin.example.com"));
        assert_eq!(completed.load(Ordering::Relaxed), 2);
    }
}
