// src/main.rs

use clap::Parser;
use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};
use vanguard_vhost::core::fuzzer::{Fuzzer, HttpFuzzer};
use vanguard_vhost::core::report::{
    ChannelSink, ConsoleSink, FanoutSink, JsonLinesSink, ReportSink, ScanEvent,
};
use vanguard_vhost::{logging, Options, RunStats, VhostScanner};

mod app;
mod cli;
mod ui;

use app::{App, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = cli::Args::parse();
    let log_path = logging::initialize_logging()?;
    info!(log = %log_path.display(), "Vanguard VHost starting.");

    let tui = args.tui;
    let output = args.output.clone();
    let options = Arc::new(args.into_options().await?);
    let fuzzer: Arc<dyn Fuzzer> = Arc::new(HttpFuzzer::new(&options)?);

    let json = match &output {
        Some(path) => Some(Arc::new(JsonLinesSink::create(path).await?)),
        None => None,
    };
    let mut sinks: Vec<Arc<dyn ReportSink>> = Vec::new();
    if let Some(json) = &json {
        sinks.push(json.clone());
    }

    if tui {
        return run_dashboard(options, fuzzer, sinks, json).await;
    }

    sinks.push(Arc::new(ConsoleSink::new(options.verbose)));
    let scanner = VhostScanner::new(options, fuzzer, Arc::new(FanoutSink::new(sinks)))?;
    let stats = scanner.run().await?;
    if let Some(json) = &json {
        json.write_event(&ScanEvent::Finished(stats));
        json.flush().await;
    }
    print_stats(&stats);
    Ok(())
}

fn print_stats(stats: &RunStats) {
    eprintln!(
        "[*] {} probes: {} confirmed, {} likely false positives, {} unverified, {} errors ({} of {} baselines failed)",
        stats.completed,
        stats.confirmed,
        stats.likely_false_positive,
        stats.unverified,
        stats.errors,
        stats.baselines_failed,
        stats.pairs
    );
}

async fn run_dashboard(
    options: Arc<Options>,
    fuzzer: Arc<dyn Fuzzer>,
    mut sinks: Vec<Arc<dyn ReportSink>>,
    json: Option<Arc<JsonLinesSink>>,
) -> Result<()> {
    let mut app = App::new(&options);
    let (tx, mut rx) = mpsc::unbounded_channel();
    sinks.push(Arc::new(ChannelSink::new(tx.clone(), app.progress_handle())));
    let mut pending = Some(VhostScanner::new(options, fuzzer, Arc::new(FanoutSink::new(sinks)))?);

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            if event::poll(Duration::from_millis(100))? {
                handle_events(&mut app)?;
            }

            if app.state == AppState::Scanning {
                if let Some(scanner) = pending.take() {
                    let tx = tx.clone();
                    let json = json.clone();
                    tokio::spawn(async move {
                        let event = match scanner.run().await {
                            Ok(stats) => ScanEvent::Finished(stats),
                            Err(e) => {
                                error!(error = %e, "Scan aborted.");
                                ScanEvent::Aborted { error: e.to_string() }
                            }
                        };
                        if let Some(json) = json {
                            json.write_event(&event);
                            json.flush().await;
                        }
                        let _ = tx.send(event);
                    });
                }
            }

            while let Ok(event) = rx.try_recv() {
                app.apply(event);
            }
            app.on_tick();
        }
        Ok::<(), color_eyre::eyre::Report>(())
    }
    .await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;
    // Quitting mid-scan still keeps what was recorded so far.
    if let Some(json) = &json {
        json.flush().await;
    }
    result
}

fn handle_events(app: &mut App) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            match (app.state, key.code) {
                (_, KeyCode::Char('q')) => app.quit(),
                (AppState::Disclaimer, KeyCode::Enter) => app.acknowledge(),
                (AppState::Disclaimer, _) => {}
                (_, KeyCode::Up) => app.scroll_up(),
                (_, KeyCode::Down) => app.scroll_down(),
                (_, KeyCode::Char('h')) => app.toggle_hits_only(),
                _ => {}
            }
        }
    }
    Ok(())
}
