// src/ui/widgets/targets.rs

use crate::app::App;
use ratatui::{prelude::*, widgets::{Block, Borders, Paragraph}};

/// Renders the bar naming the targets and the run settings.
pub fn render_targets(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Targets");
    let text = Text::from(vec![
        Line::from(app.targets.as_str()).style(Style::default().fg(Color::Yellow)),
        Line::from(app.settings.as_str()).style(Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(text).block(block), area);
}
