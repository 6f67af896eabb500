// src/app.rs

use ratatui::widgets::ListState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vanguard_vhost::core::report::ScanEvent;
use vanguard_vhost::{Options, Outcome, RunStats, Verdict};

pub const SPINNER_CHARS: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Disclaimer,
    Scanning,
    Finished,
}

/// Live counters shown in the summary panel.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub expected: usize,
    pub completed: usize,
    pub confirmed: usize,
    pub likely_false_positive: usize,
    pub unverified: usize,
    pub same: usize,
    pub errors: usize,
    pub baselines_ok: usize,
    pub baselines_failed: usize,
}

impl ScanSummary {
    /// Progress in percent, 0 before any baseline came back.
    pub fn percent(&self) -> u16 {
        if self.expected == 0 {
            return 0;
        }
        ((self.completed.min(self.expected) * 100) / self.expected) as u16
    }
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub targets: String,
    pub settings: String,
    pub outcomes: Vec<Outcome>,
    pub baseline_errors: Vec<String>,
    pub summary: ScanSummary,
    pub stats: Option<RunStats>,
    pub error: Option<String>,
    pub results_state: ListState,
    pub spinner_frame: usize,
    pub only_hits: bool,
    completed: Arc<AtomicUsize>,
}

impl App {
    pub fn new(options: &Options) -> Self {
        let targets = format!(
            "{} on {}:{}",
            options.ips.join(", "),
            options.paths.join(", "),
            options.effective_port()
        );
        let settings = format!(
            "{} threads | compare {} | verify {}",
            options.threads,
            options.compare,
            if options.verify { "on" } else { "off" }
        );
        Self {
            should_quit: false,
            state: AppState::Disclaimer,
            targets,
            settings,
            outcomes: Vec::new(),
            baseline_errors: Vec::new(),
            summary: ScanSummary::default(),
            stats: None,
            error: None,
            results_state: ListState::default(),
            spinner_frame: 0,
            only_hits: false,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Counter the scanner's channel sink increments once per finished job.
    pub fn progress_handle(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.completed)
    }

    pub fn apply(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Baseline(report) => {
                self.summary.expected += report.jobs;
                match report.error {
                    Some(error) => {
                        self.summary.baselines_failed += 1;
                        self.baseline_errors.push(format!("{}{}: {}", report.ip, report.path, error));
                    }
                    None => self.summary.baselines_ok += 1,
                }
            }
            ScanEvent::Outcome(outcome) => {
                match outcome.verdict {
                    Verdict::Confirmed => self.summary.confirmed += 1,
                    Verdict::LikelyFalsePositive => self.summary.likely_false_positive += 1,
                    Verdict::Unverified => self.summary.unverified += 1,
                    Verdict::Same => self.summary.same += 1,
                    Verdict::Error => self.summary.errors += 1,
                }
                self.outcomes.push(outcome);
                if self.results_state.selected().is_none() {
                    self.results_state.select(Some(0));
                }
            }
            ScanEvent::Finished(stats) => {
                self.summary.completed = stats.completed;
                self.summary.same = stats.same;
                self.stats = Some(stats);
                self.state = AppState::Finished;
            }
            ScanEvent::Aborted { error } => {
                self.error = Some(error);
                self.state = AppState::Finished;
            }
        }
    }

    /// Outcomes currently listed, honouring the hits-only filter.
    pub fn visible_outcomes(&self) -> Vec<&Outcome> {
        self.outcomes
            .iter()
            .filter(|o| !self.only_hits || matches!(o.verdict, Verdict::Confirmed | Verdict::Unverified))
            .collect()
    }

    pub fn selected_outcome(&self) -> Option<&Outcome> {
        self.results_state
            .selected()
            .and_then(|i| self.visible_outcomes().get(i).copied())
    }

    pub fn scroll_up(&mut self) {
        let index = self.results_state.selected().unwrap_or(0).saturating_sub(1);
        self.results_state.select(Some(index));
    }

    pub fn scroll_down(&mut self) {
        let len = self.visible_outcomes().len();
        if len == 0 {
            return;
        }
        let index = self.results_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.results_state.select(Some(index));
    }

    pub fn toggle_hits_only(&mut self) {
        self.only_hits = !self.only_hits;
        let has_rows = !self.visible_outcomes().is_empty();
        self.results_state.select(if has_rows { Some(0) } else { None });
    }

    pub fn acknowledge(&mut self) {
        if self.state == AppState::Disclaimer {
            self.state = AppState::Scanning;
        }
    }

    pub fn on_tick(&mut self) {
        if self.state == AppState::Scanning {
            self.summary.completed = self.completed.load(Ordering::Relaxed);
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vanguard_vhost::core::models::BaselineReport;

    fn outcome(domain: &str, verdict: Verdict) -> Outcome {
        Outcome {
            ip: "10.0.0.1".into(),
            path: "/".into(),
            domain: domain.into(),
            status: Some(200),
            content_length: Some(10),
            verdict,
            note: None,
            timestamp: Utc::now(),
        }
    }

    fn options() -> Options {
        Options {
            ips: vec!["10.0.0.1".into()],
            ..Options::default()
        }
    }

    #[test]
    fn tracks_events() {
        let mut app = App::new(&options());
        app.acknowledge();
        app.apply(ScanEvent::Baseline(BaselineReport {
            ip: "10.0.0.1".into(),
            path: "/".into(),
            status: Some(404),
            content_length: Some(0),
            error: None,
            jobs: 4,
        }));
        app.apply(ScanEvent::Outcome(outcome("a.example.com", Verdict::Confirmed)));
        app.apply(ScanEvent::Outcome(outcome("b.example.com", Verdict::LikelyFalsePositive)));

        assert_eq!(app.summary.expected, 4);
        assert_eq!(app.summary.confirmed, 1);
        assert_eq!(app.visible_outcomes().len(), 2);
        assert_eq!(app.selected_outcome().unwrap().domain, "a.example.com");

        app.toggle_hits_only();
        assert_eq!(app.visible_outcomes().len(), 1);

        app.progress_handle().store(4, Ordering::Relaxed);
        app.on_tick();
        assert_eq!(app.summary.percent(), 100);

        app.apply(ScanEvent::Finished(RunStats { completed: 4, ..RunStats::default() }));
        assert_eq!(app.state, AppState::Finished);
    }

    #[test]
    fn scrolling_stays_in_bounds() {
        let mut app = App::new(&options());
        app.scroll_down();
        assert_eq!(app.results_state.selected(), None);

        app.apply(ScanEvent::Outcome(outcome("a.example.com", Verdict::Confirmed)));
        app.apply(ScanEvent::Outcome(outcome("b.example.com", Verdict::Confirmed)));
        app.scroll_down();
        app.scroll_down();
        assert_eq!(app.results_state.selected(), Some(1));
        app.scroll_up();
        app.scroll_up();
        assert_eq!(app.results_state.selected(), Some(0));
    }
}
