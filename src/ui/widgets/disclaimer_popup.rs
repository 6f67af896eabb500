// src/ui/widgets/disclaimer_popup.rs

use ratatui::{
    layout::Flex,
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Authorization notice shown before any request leaves the machine.
pub fn render_disclaimer_popup(frame: &mut Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from("AUTHORIZED USE ONLY".bold().yellow()),
        Line::from(""),
        Line::from("Every candidate hostname becomes one request with a forged Host header, sent to each target address and path. Large wordlists produce heavy traffic that intrusion detection will notice."),
        Line::from(""),
        Line::from("Only scan addresses you own or have written permission to test. Unauthorized enumeration is illegal in many jurisdictions, and the author accepts no liability for misuse."),
        Line::from(""),
        Line::from(vec!["Press ".bold(), "Enter".bold().yellow(), " to start, ".bold(), "q".bold().yellow(), " to quit".bold()]),
    ]);

    let popup_area = centered_rect(60, 50, area);
    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .title("Before you scan")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(r);
    let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    cell
}
