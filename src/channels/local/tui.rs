use crate::channels::local::session::{parse_chat_input, ChatCommand, CHAT_INPUT_HINT, CHAT_TITLE};
use crate::consultation::{ConsultationView, ControllerState, SessionController};
use crate::provider::CompletionGateway;
use crate::transcript::{Speaker, Turn};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const UI_POLL_INTERVAL: Duration = Duration::from_millis(60);
const CURSOR_BLINK_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Patient,
    Assistant,
    Error,
    Notice,
}

impl LineKind {
    fn label(self) -> &'static str {
        match self {
            Self::Patient => "you",
            Self::Assistant => "assistant",
            Self::Error => "error",
            Self::Notice => "notice",
        }
    }

    fn style(self) -> Style {
        match self {
            Self::Patient => Style::default().fg(Color::Yellow),
            Self::Assistant => Style::default().fg(Color::Green),
            Self::Error => Style::default().fg(Color::Red),
            Self::Notice => Style::default().fg(Color::Gray),
        }
    }
}

#[derive(Debug, Clone)]
struct ChatLine {
    kind: LineKind,
    text: String,
}

struct TuiState {
    input: String,
    transcript: Vec<ChatLine>,
    controller_state: ControllerState,
    cursor_visible: bool,
    last_cursor_tick: Instant,
}

impl TuiState {
    fn new() -> Self {
        Self {
            input: String::new(),
            transcript: Vec::new(),
            controller_state: ControllerState::Idle,
            cursor_visible: true,
            last_cursor_tick: Instant::now(),
        }
    }

    fn push(&mut self, kind: LineKind, text: &str) {
        self.transcript.push(ChatLine {
            kind,
            text: text.to_string(),
        });
    }

    fn status_line(&self) -> String {
        match self.controller_state {
            ControllerState::AwaitingCompletion => "assistant> thinking...".to_string(),
            ControllerState::Error => "last request failed".to_string(),
            ControllerState::Idle => format!(
                "{CHAT_INPUT_HINT}  Enter sends, /new or Ctrl+N starts a new consultation, Esc quits"
            ),
        }
    }

    fn advance_cursor_blink_if_needed(&mut self) {
        if self.last_cursor_tick.elapsed() >= CURSOR_BLINK_INTERVAL {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_tick = Instant::now();
        }
    }

    fn cursor_suffix(&self) -> &'static str {
        if self.cursor_visible {
            "█"
        } else {
            " "
        }
    }

    /// Multi-line messages keep their line breaks; continuation lines are
    /// indented under the speaker label.
    fn transcript_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for chat_line in &self.transcript {
            let label = chat_line.kind.label();
            let indent = " ".repeat(label.len() + 2);
            for (index, part) in chat_line.text.lines().enumerate() {
                let text = if index == 0 {
                    format!("{label}> {part}")
                } else {
                    format!("{indent}{part}")
                };
                lines.push(Line::styled(text, chat_line.kind.style()));
            }
        }
        lines
    }
}

/// Redraws after every controller callback so the patient's message and the
/// thinking status are visible while the gateway call blocks.
struct TuiView<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    state: &'a mut TuiState,
    render_error: Option<String>,
}

impl<'a, B: Backend> TuiView<'a, B> {
    fn new(terminal: &'a mut Terminal<B>, state: &'a mut TuiState) -> Self {
        Self {
            terminal,
            state,
            render_error: None,
        }
    }

    fn redraw(&mut self) {
        if self.render_error.is_some() {
            return;
        }
        if let Err(err) = draw_chat_ui(self.terminal, self.state) {
            self.render_error = Some(err);
        }
    }

    fn finish(self) -> Result<(), String> {
        match self.render_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<B: Backend> ConsultationView for TuiView<'_, B> {
    fn show_turn(&mut self, turn: &Turn) {
        let kind = match turn.speaker() {
            Speaker::User => LineKind::Patient,
            Speaker::Assistant => LineKind::Assistant,
        };
        self.state.push(kind, turn.content());
        self.redraw();
    }

    fn show_error(&mut self, message: &str) {
        self.state.push(LineKind::Error, message);
        self.redraw();
    }

    fn show_notice(&mut self, message: &str) {
        self.state.push(LineKind::Notice, message);
        self.redraw();
    }

    fn state_changed(&mut self, state: ControllerState) {
        self.state.controller_state = state;
        self.redraw();
    }
}

pub fn run_consultation_tui<G: CompletionGateway>(
    controller: &mut SessionController<G>,
) -> Result<(), String> {
    let mut terminal = setup_terminal()?;
    let mut state = TuiState::new();

    let result = run_event_loop(&mut terminal, controller, &mut state);
    teardown_terminal(&mut terminal)?;

    result
}

fn run_event_loop<B: Backend, G: CompletionGateway>(
    terminal: &mut Terminal<B>,
    controller: &mut SessionController<G>,
    state: &mut TuiState,
) -> Result<(), String> {
    loop {
        state.advance_cursor_blink_if_needed();
        draw_chat_ui(terminal, state)?;

        if !event::poll(UI_POLL_INTERVAL).map_err(|e| format!("failed to poll events: {e}"))? {
            continue;
        }

        let Event::Key(key) = event::read().map_err(|e| format!("failed to read event: {e}"))?
        else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => break,
                KeyCode::Char('n') => {
                    let mut view = TuiView::new(terminal, state);
                    controller.reset(&mut view);
                    view.finish()?;
                }
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Esc => break,
            KeyCode::Enter => {
                let raw = std::mem::take(&mut state.input);
                match parse_chat_input(&raw) {
                    ChatCommand::Empty => {}
                    ChatCommand::Exit => break,
                    ChatCommand::Reset => {
                        let mut view = TuiView::new(terminal, state);
                        controller.reset(&mut view);
                        view.finish()?;
                    }
                    ChatCommand::Message(message) => {
                        let mut view = TuiView::new(terminal, state);
                        controller.submit(&message, &mut view);
                        view.finish()?;
                    }
                }
                state.cursor_visible = true;
                state.last_cursor_tick = Instant::now();
            }
            KeyCode::Backspace => {
                state.input.pop();
            }
            KeyCode::Char(c) => {
                state.input.push(c);
            }
            _ => {}
        }
    }

    Ok(())
}

fn draw_chat_ui<B: Backend>(terminal: &mut Terminal<B>, state: &TuiState) -> Result<(), String> {
    terminal
        .draw(|frame| {
            let sections = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(6),
                    Constraint::Length(3),
                    Constraint::Length(3),
                ])
                .split(frame.area());

            let header = Paragraph::new(Line::raw(CHAT_TITLE)).block(
                Block::default()
                    .title("Consultation")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
            frame.render_widget(header, sections[0]);

            let lines = state.transcript_lines();
            let visible = sections[1].height.saturating_sub(2) as usize;
            let scroll = lines.len().saturating_sub(visible) as u16;
            let transcript_widget = Paragraph::new(lines)
                .block(Block::default().title("Transcript").borders(Borders::ALL))
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            frame.render_widget(transcript_widget, sections[1]);

            let busy = state.controller_state == ControllerState::AwaitingCompletion;
            let status_widget = Paragraph::new(state.status_line()).block(
                Block::default()
                    .title("Status")
                    .borders(Borders::ALL)
                    .border_style(if busy {
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    }),
            );
            frame.render_widget(status_widget, sections[2]);

            let input_widget =
                Paragraph::new(format!("you> {}{}", state.input, state.cursor_suffix()))
                    .block(Block::default().title("Input").borders(Borders::ALL));
            frame.render_widget(input_widget, sections[3]);
        })
        .map_err(|e| format!("failed to render consultation UI: {e}"))?;

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, String> {
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)
        .map_err(|e| format!("failed to enter alternate screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| format!("failed to initialize terminal: {e}"))
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), String> {
    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
        .map_err(|e| format!("failed to leave alternate screen: {e}"))?;
    terminal
        .show_cursor()
        .map_err(|e| format!("failed to restore cursor: {e}"))?;
    Ok(())
}
