use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn draw_help(area: Rect, f: &mut Frame) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Magenta));
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            key("Esc"),
            Span::raw(" / "),
            key("Ctrl-C"),
            Span::raw("  Quit"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Tab"),
            Span::raw("          Switch input focus"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Enter"),
            Span::raw("        Ask (question/top_k) or add file (file input)"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Ctrl-U"),
            Span::raw("       Upload the selected files"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Ctrl-X"),
            Span::raw("       Clear the file selection"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Ctrl-R"),
            Span::raw("       Toggle raw JSON view of the answer"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Ctrl-E"),
            Span::raw("       Export the answer as HTML"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("Ctrl-Y"),
            Span::raw("       Copy the raw JSON to the clipboard"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("↑/↓"),
            Span::raw("          Scroll the answer pane"),
        ]),
        Line::from(vec![
            Span::raw("  "),
            key("PgUp/PgDn"),
            Span::raw("    Scroll the upload pane"),
        ]),
        Line::from(""),
        Line::from("Both triggers are disabled while a request is in flight."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
