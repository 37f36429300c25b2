mod help;

use crate::cli::{build_config, Cli};
use crate::export;
use crate::model::{AnswerResult, AppEvent, InfoEvent};
use crate::orchestrator::{self, UiCommand};
use crate::summary;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::{io, path::PathBuf, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Which input field receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Question,
    TopK,
    FilePath,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Question => Focus::TopK,
            Focus::TopK => Focus::FilePath,
            Focus::FilePath => Focus::Question,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Question => Focus::FilePath,
            Focus::TopK => Focus::Question,
            Focus::FilePath => Focus::TopK,
        }
    }
}

struct UiState {
    focus: Focus,
    question: String,
    top_k_input: String,
    file_input: String,
    selection: Vec<PathBuf>,

    busy: bool,
    /// Upload-status area: raw response JSON, progress, or a notice.
    upload_out: String,
    /// Rendered answer pane content.
    answer_lines: Vec<String>,
    /// Raw query response for the debug view and clipboard/export.
    raw_answer: String,
    show_raw: bool,
    last_result: Option<AnswerResult>,

    info: String,
    show_help: bool,
    upload_scroll: u16,
    answer_scroll: u16,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Focus::Question,
            question: String::new(),
            top_k_input: String::new(),
            file_input: String::new(),
            selection: Vec::new(),
            busy: false,
            upload_out: String::new(),
            answer_lines: Vec::new(),
            raw_answer: String::new(),
            show_raw: false,
            last_result: None,
            info: String::new(),
            show_help: false,
            upload_scroll: 0,
            answer_scroll: 0,
        }
    }
}

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the
    // controller task.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let cfg = build_config(&args);

    // The TUI runs in a dedicated thread to keep blocking terminal I/O out of
    // the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        selection: args.files.clone(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Esc) => {
                        if state.show_help {
                            state.show_help = false;
                        } else {
                            let _ = cmd_tx.send(UiCommand::Quit);
                            break Ok(());
                        }
                    }
                    (_, KeyCode::F(1)) => {
                        state.show_help = !state.show_help;
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
                        trigger_upload(&mut state, &cmd_tx);
                    }
                    // Ctrl-J arrives as a line feed on legacy terminals, so the
                    // raw toggle lives on Ctrl-R.
                    (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
                        state.show_raw = !state.show_raw;
                        state.answer_scroll = 0;
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('e')) => {
                        export_answer(&mut state);
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('y')) => {
                        if state.raw_answer.is_empty() {
                            state.info = "No answer to copy yet".into();
                        } else {
                            match copy_to_clipboard(&state.raw_answer) {
                                Ok(()) => state.info = "Copied raw JSON to clipboard".into(),
                                Err(e) => state.info = format!("Copy failed: {e:#}"),
                            }
                        }
                    }
                    (KeyModifiers::CONTROL, KeyCode::Char('x')) => {
                        state.selection.clear();
                        state.info = "Selection cleared".into();
                    }
                    (_, KeyCode::Tab) => state.focus = state.focus.next(),
                    (_, KeyCode::BackTab) => state.focus = state.focus.prev(),
                    (_, KeyCode::Enter) => match state.focus {
                        Focus::Question | Focus::TopK => trigger_ask(&mut state, &cmd_tx),
                        Focus::FilePath => add_selected_file(&mut state),
                    },
                    (_, KeyCode::Backspace) => {
                        focused_input(&mut state).pop();
                    }
                    (_, KeyCode::Up) => {
                        state.answer_scroll = state.answer_scroll.saturating_sub(1);
                    }
                    (_, KeyCode::Down) => {
                        state.answer_scroll = state.answer_scroll.saturating_add(1);
                    }
                    (_, KeyCode::PageUp) => {
                        state.upload_scroll = state.upload_scroll.saturating_sub(5);
                    }
                    (_, KeyCode::PageDown) => {
                        state.upload_scroll = state.upload_scroll.saturating_add(5);
                    }
                    (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                        focused_input(&mut state).push(c);
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn focused_input(state: &mut UiState) -> &mut String {
    match state.focus {
        Focus::Question => &mut state.question,
        Focus::TopK => &mut state.top_k_input,
        Focus::FilePath => &mut state.file_input,
    }
}

/// Both triggers are inert while a request is in flight; suppressed actions
/// are dropped, never queued.
fn trigger_ask(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    if state.busy {
        state.info = "Request in flight; ask is disabled".into();
        return;
    }
    // Both answer areas clear at trigger time; a validation notice or the
    // in-progress placeholder repopulates the rendered pane.
    state.raw_answer.clear();
    state.answer_lines.clear();
    state.answer_scroll = 0;
    let _ = cmd_tx.send(UiCommand::Ask {
        question: state.question.clone(),
        top_k: state.top_k_input.clone(),
    });
}

fn trigger_upload(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) {
    if state.busy {
        state.info = "Request in flight; upload is disabled".into();
        return;
    }
    state.upload_out.clear();
    state.upload_scroll = 0;
    let _ = cmd_tx.send(UiCommand::Upload {
        files: state.selection.clone(),
    });
}

fn add_selected_file(state: &mut UiState) {
    let raw = state.file_input.trim();
    if raw.is_empty() {
        return;
    }
    let path = PathBuf::from(raw);
    if !path.is_file() {
        state.info = format!("No such file: {raw}");
        return;
    }
    state.selection.push(path);
    state.file_input.clear();
    state.info = format!("{} file(s) selected", state.selection.len());
}

fn export_answer(state: &mut UiState) {
    let Some(result) = state.last_result.clone() else {
        state.info = "No answer to export yet".into();
        return;
    };
    let name = export::default_report_name("html");
    let path = match std::env::current_dir() {
        Ok(dir) => dir.join(name),
        Err(_) => PathBuf::from(name),
    };
    match export::export_html(&path, &result) {
        Ok(()) => state.info = format!("Exported: {}", path.display()),
        Err(e) => state.info = format!("Export failed: {e:#}"),
    }
}

fn apply_event(state: &mut UiState, ev: AppEvent) {
    match ev {
        AppEvent::BusyChanged { busy } => state.busy = busy,
        AppEvent::UploadStarted { files } => {
            state.upload_out = format!("Uploading {files} file(s)…");
            state.upload_scroll = 0;
        }
        AppEvent::UploadCompleted { raw_json } => {
            state.upload_out = raw_json;
            state.info = "Upload finished".into();
        }
        AppEvent::UploadFailed { error } => {
            state.upload_out = format!("Upload failed: {error}");
        }
        AppEvent::AskStarted { .. } => {
            // Raw and rendered panes reset at dispatch, not again on failure.
            state.raw_answer.clear();
            state.answer_lines = vec!["Thinking…".to_string()];
            state.last_result = None;
            state.answer_scroll = 0;
        }
        AppEvent::AskCompleted { raw_json, result } => {
            state.raw_answer = raw_json;
            state.answer_lines = summary::build_answer_summary(&result).lines;
            state.last_result = Some(*result);
        }
        AppEvent::AskFailed { error } => {
            state.answer_lines = vec![format!("Query failed: {error}")];
        }
        AppEvent::Info(info) => match info {
            InfoEvent::EmptySelection => state.upload_out = info.to_message(),
            InfoEvent::EmptyQuestion | InfoEvent::InvalidTopK { .. } => {
                state.answer_lines = vec![info.to_message()];
            }
            InfoEvent::Message(_) => state.info = info.to_message(),
        },
    }
}

fn input_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw(f: &mut ratatui::Frame, state: &UiState) {
    let area = f.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    draw_inputs(f, rows[0], state);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[1]);
    draw_upload_pane(f, panes[0], state);
    draw_answer_pane(f, panes[1], state);

    draw_status_bar(f, rows[2], state);

    if state.show_help {
        help::draw_help(centered_rect(60, 70, area), f);
    }
}

fn draw_inputs(f: &mut ratatui::Frame, area: Rect, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(30),
            Constraint::Length(12),
            Constraint::Percentage(30),
        ])
        .split(area);

    let question = Paragraph::new(state.question.as_str())
        .block(input_block("Question", state.focus == Focus::Question));
    f.render_widget(question, cols[0]);

    let top_k = Paragraph::new(state.top_k_input.as_str())
        .block(input_block("top_k (6)", state.focus == Focus::TopK));
    f.render_widget(top_k, cols[1]);

    let file = Paragraph::new(state.file_input.as_str())
        .block(input_block("Add file", state.focus == Focus::FilePath));
    f.render_widget(file, cols[2]);

    // Cursor in the focused field, clamped to the field width.
    let (rect, text) = match state.focus {
        Focus::Question => (cols[0], &state.question),
        Focus::TopK => (cols[1], &state.top_k_input),
        Focus::FilePath => (cols[2], &state.file_input),
    };
    let max_x = rect.x + rect.width.saturating_sub(2);
    let x = (rect.x + 1 + text.chars().count() as u16).min(max_x);
    f.set_cursor_position((x, rect.y + 1));
}

fn draw_upload_pane(f: &mut ratatui::Frame, area: Rect, state: &UiState) {
    let mut lines: Vec<Line> = Vec::new();
    if state.selection.is_empty() {
        lines.push(Line::from(Span::styled(
            "No files selected",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        for p in &state.selection {
            lines.push(Line::from(format!("• {}", p.display())));
        }
    }
    lines.push(Line::from(""));
    for l in state.upload_out.lines() {
        lines.push(Line::from(l.to_string()));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.upload_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title("Upload"));
    f.render_widget(p, area);
}

fn draw_answer_pane(f: &mut ratatui::Frame, area: Rect, state: &UiState) {
    let (title, lines): (&str, Vec<Line>) = if state.show_raw {
        (
            "Answer (raw JSON)",
            state
                .raw_answer
                .lines()
                .map(|l| Line::from(l.to_string()))
                .collect(),
        )
    } else {
        (
            "Answer",
            state
                .answer_lines
                .iter()
                .map(|l| Line::from(l.clone()))
                .collect(),
        )
    };

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((state.answer_scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, area);
}

fn draw_status_bar(f: &mut ratatui::Frame, area: Rect, state: &UiState) {
    let mut spans = vec![if state.busy {
        Span::styled("● busy", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("● idle", Style::default().fg(Color::Green))
    }];
    spans.push(Span::raw("  "));
    if !state.info.is_empty() {
        spans.push(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Gray),
        ));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::styled(
        "Enter ask · Ctrl-U upload · Ctrl-R raw · F1 help",
        Style::default().fg(Color::DarkGray),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}

static CLIPBOARD_TX: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Queue text for the clipboard without blocking the UI thread.
///
/// Writes run sequentially on a lazily-started thread that holds each
/// `Clipboard` instance open for a couple of seconds; on Linux, clipboard
/// managers need the owner alive to read the contents.
fn copy_to_clipboard(text: &str) -> Result<()> {
    let tx = CLIPBOARD_TX.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();
        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });
        tx
    });

    tx.send(text.to_string())
        .map_err(|_| anyhow::anyhow!("clipboard thread stopped"))?;
    Ok(())
}
