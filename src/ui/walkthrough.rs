use super::{key_hints, render_notice, title_bar};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::io;
use student_acid::accounts::total_balance;
use student_acid::{Notice, Phase, Session, Step, Tone};

pub struct App {
    pub session: Session,
    pub notice: Option<Notice>,
    log_state: ListState,
}

impl App {
    pub fn new(session: Session) -> Self {
        let mut app = Self {
            session,
            notice: None,
            log_state: ListState::default(),
        };
        app.follow_log();
        app
    }

    /// Returns true when the user asked to quit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.notice.is_some() {
            self.notice = None;
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char(c) => {
                if let Some(step) = step_for_key(c) {
                    self.trigger(step);
                }
            }
            _ => {}
        }
        false
    }

    /// Run a step; failures only reach the log, successes may raise a notice
    pub fn trigger(&mut self, step: Step) {
        if self.session.apply(step).is_ok() {
            self.notice = step.success_notice();
        }
        self.follow_log();
    }

    fn follow_log(&mut self) {
        let len = self.session.log().len();
        self.log_state.select(len.checked_sub(1));
    }
}

fn step_for_key(c: char) -> Option<Step> {
    let index = c.to_digit(10)? as usize;
    Step::ALL.get(index.checked_sub(1)?).copied()
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::White,
        Tone::Begin => Color::Blue,
        Tone::Pending => Color::Rgb(255, 165, 0),
        Tone::Caution => Color::Magenta,
        Tone::Success => Color::Green,
        Tone::Failure => Color::Red,
    }
}

pub fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title + phase
            Constraint::Length(6), // Balances
            Constraint::Min(0),    // Transaction log
            Constraint::Length(3), // Key hints
        ])
        .split(f.size());

    let phase = app.session.phase();
    let phase_color = match phase {
        Phase::NoTransaction => Color::Green,
        Phase::OpenUncommitted => Color::Rgb(255, 165, 0),
        Phase::ClosedByCrash => Color::Red,
    };
    title_bar(
        f,
        chunks[0],
        "💾 ACID Properties Demo",
        vec![
            Span::raw("Session: "),
            Span::styled(phase.label().to_string(), Style::default().fg(phase_color)),
        ],
    );

    render_balances(f, chunks[1], app);
    render_log(f, chunks[2], app);

    let amount = app.session.config().transfer_amount;
    let transfer_label = format!(
        "Transfer {} ({}→{})",
        amount,
        app.session.config().source,
        app.session.config().destination
    );
    let hints: Vec<(String, String)> = Step::ALL
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let label = match step {
                Step::Transfer => transfer_label.clone(),
                other => other.label().to_string(),
            };
            ((i + 1).to_string(), label)
        })
        .chain(std::iter::once(("q".to_string(), "Exit".to_string())))
        .collect();
    let hint_refs: Vec<(&str, &str)> = hints.iter().map(|(k, l)| (k.as_str(), l.as_str())).collect();
    key_hints(f, chunks[3], &hint_refs);

    if let Some(notice) = &app.notice {
        render_notice(f, notice);
    }
}

fn render_balances(f: &mut Frame, area: Rect, app: &App) {
    let balances = app.session.last_balances();
    let stale = app.session.phase() == Phase::ClosedByCrash;

    let mut lines: Vec<Line> = balances
        .iter()
        .map(|a| {
            Line::from(vec![
                Span::styled(format!("{:<8}", a.name), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("{:>8}", a.balance)),
            ])
        })
        .collect();
    lines.push(Line::from(Span::styled(
        format!("Total: {}", total_balance(balances)),
        Style::default().fg(Color::DarkGray),
    )));

    let title = if stale {
        " Account Balances (last seen before crash) "
    } else {
        " Account Balances "
    };

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    );

    f.render_widget(panel, area);
}

fn render_log(f: &mut Frame, area: Rect, app: &mut App) {
    let items: Vec<ListItem> = app
        .session
        .log()
        .entries()
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", entry.clock()), Style::default().fg(Color::DarkGray)),
                Span::styled(entry.message.clone(), Style::default().fg(tone_color(entry.tone))),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Transaction Log "),
    );

    f.render_stateful_widget(list, area, &mut app.log_state);
}
