// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

/// Renders the summary widget: progress, verdict counts and baseline health.
///
/// # Arguments
/// * `frame` - The `Frame` used for rendering the UI.
/// * `app` - A reference to the application's state.
/// * `area` - The `Rect` defining the drawable area for this widget.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2), // Progress label
            Constraint::Length(1), // Gauge
            Constraint::Length(1), // Spacer
            Constraint::Length(6), // Verdicts
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Baselines
        ])
        .split(area);

    if app.state == AppState::Disclaimer {
        return;
    }

    let summary = &app.summary;

    // --- Progress ---
    let status = match app.state {
        AppState::Finished if app.error.is_some() => "Aborted".red(),
        AppState::Finished => "Finished".green(),
        _ => "Scanning".cyan(),
    };
    let progress_text = Text::from(vec![
        Line::from(status.bold()),
        Line::from(format!("{}/{} probes", summary.completed, summary.expected)),
    ]);
    frame.render_widget(Paragraph::new(progress_text).alignment(Alignment::Center), summary_chunks[0]);

    let gauge = Gauge::default()
        .percent(summary.percent())
        .style(Style::default().fg(if app.state == AppState::Finished { Color::Green } else { Color::Cyan }));
    frame.render_widget(gauge, summary_chunks[1]);

    // --- Verdicts ---
    let count = |label: &'static str, value: usize, color: Color| {
        Line::from(vec![Span::raw(label), Span::styled(value.to_string(), Style::default().fg(color))])
    };
    let verdict_lines = vec![
        count("Confirmed:      ", summary.confirmed, Color::Green),
        count("False positive: ", summary.likely_false_positive, Color::Yellow),
        count("Unverified:     ", summary.unverified, Color::Cyan),
        count("Same:           ", summary.same, Color::DarkGray),
        count("Errors:         ", summary.errors, Color::Red),
    ];
    let verdicts_block = Block::default().title("VERDICTS".bold());
    frame.render_widget(Paragraph::new(verdict_lines).block(verdicts_block), summary_chunks[3]);

    // --- Baselines ---
    let mut baseline_lines = vec![
        count("Healthy: ", summary.baselines_ok, Color::Green),
        count("Failed:  ", summary.baselines_failed, Color::Red),
    ];
    for error in &app.baseline_errors {
        baseline_lines.push(Line::from(Span::styled(format!("- {}", error), Style::default().fg(Color::Red))));
    }
    let baselines_block = Block::default().title("BASELINES".bold());
    frame.render_widget(
        Paragraph::new(baseline_lines).block(baselines_block).wrap(Wrap { trim: true }),
        summary_chunks[5],
    );
}
