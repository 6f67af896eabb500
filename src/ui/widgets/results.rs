// src/ui/widgets/results.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use vanguard_vhost::{Outcome, Verdict};

fn verdict_style(verdict: Verdict) -> Style {
    match verdict {
        Verdict::Confirmed => Style::default().fg(Color::Green),
        Verdict::LikelyFalsePositive => Style::default().fg(Color::Yellow),
        Verdict::Unverified => Style::default().fg(Color::Cyan),
        Verdict::Same => Style::default().fg(Color::DarkGray),
        Verdict::Error => Style::default().fg(Color::Red),
    }
}

fn field<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Renders the list of reported outcomes and the details of the selected one.
pub fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Virtual Hosts (Navigate with ↑ ↓)");

    if app.outcomes.is_empty() {
        let content = match app.state {
            AppState::Disclaimer => Paragraph::new("Results will appear here...").alignment(Alignment::Center),
            AppState::Scanning => Paragraph::new(Line::from(vec![
                Span::styled(format!("{} ", SPINNER_CHARS[app.spinner_frame]), Style::default().fg(Color::Cyan)),
                Span::raw("Probing... no distinct vhost yet."),
            ]))
            .alignment(Alignment::Center),
            AppState::Finished => Paragraph::new(match &app.error {
                Some(error) => Line::from(Span::styled(
                    format!("Scan aborted: {}", error),
                    Style::default().fg(Color::Red),
                )),
                None => Line::from("No virtual host differed from its baseline."),
            })
            .alignment(Alignment::Center),
        };
        frame.render_widget(content.block(main_block), area);
        return;
    }

    let inner_area = main_block.inner(area);
    frame.render_widget(main_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(65), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .visible_outcomes()
        .into_iter()
        .map(|o| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", o.verdict.marker()), verdict_style(o.verdict)),
                Span::styled(format!("[{}] ", field(o.status)), Style::default().fg(Color::DarkGray)),
                Span::styled(o.domain.clone(), verdict_style(o.verdict)),
                Span::styled(format!("  {}{}", o.ip, o.path), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default())
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(list, chunks[0], &mut app.results_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let detail = match app.selected_outcome() {
        Some(outcome) => Paragraph::new(detail_lines(outcome)).wrap(Wrap { trim: true }),
        None => Paragraph::new("Select an item above to see details.").alignment(Alignment::Center),
    };
    frame.render_widget(detail.block(detail_block), chunks[1]);
}

fn detail_lines(outcome: &Outcome) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(vec![
            Span::styled(outcome.domain.clone(), Style::default().bold()),
            Span::raw(" - "),
            Span::styled(outcome.verdict.to_string(), verdict_style(outcome.verdict)),
        ]),
        Line::from(format!("Target: {}{}", outcome.ip, outcome.path)),
        Line::from(format!(
            "Status: {}  Length: {}",
            field(outcome.status),
            field(outcome.content_length)
        )),
        Line::from(format!("Seen: {}", outcome.timestamp.format("%H:%M:%S"))),
    ];
    if let Some(note) = &outcome.note {
        lines.push(Line::from(""));
        lines.push(Line::from(note.clone()).style(Style::default().fg(Color::Yellow)));
    }
    lines
}
