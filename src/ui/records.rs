use super::{key_hints, render_notice, render_prompt, title_bar, TextPrompt};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use student_acid::records::{
    added_notice, deleted_notice, found_notice, sort_notice, view_notice,
};
use student_acid::{Notice, RecordStore, StudentDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddField {
    Name,
    RegNo,
    Grade,
}

#[derive(Debug, Clone)]
enum Pending {
    Add { field: AddField, draft: StudentDraft },
    Search,
    Delete,
}

pub struct App {
    pub store: RecordStore,
    pub state: TableState,
    pub notice: Option<Notice>,
    csv_path: Option<PathBuf>,
    prompt: Option<(Pending, TextPrompt)>,
}

impl App {
    pub fn new(store: RecordStore, csv_path: Option<PathBuf>) -> Self {
        let mut state = TableState::default();
        if !store.is_empty() {
            state.select(Some(0));
        }

        Self {
            store,
            state,
            notice: None,
            csv_path,
            prompt: None,
        }
    }

    /// Returns true when the user asked to quit
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        // A notice blocks everything until dismissed
        if self.notice.is_some() {
            self.notice = None;
            return false;
        }

        if self.prompt.is_some() {
            self.handle_prompt_key(code);
            return false;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('a') => self.begin_add(),
            KeyCode::Char('s') => {
                self.prompt = Some((Pending::Search, TextPrompt::new("Search", "Enter name or registration number:")));
            }
            KeyCode::Char('d') => {
                self.prompt = Some((Pending::Delete, TextPrompt::new("Delete", "Enter registration number:")));
            }
            KeyCode::Char('o') => {
                let outcome = self.store.sort_by_grade();
                self.notice = Some(sort_notice(outcome));
            }
            KeyCode::Char('r') => {
                self.clamp_selection();
                self.notice = view_notice(&self.store.view());
            }
            KeyCode::Char('w') => self.save(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            _ => {}
        }
        false
    }

    fn begin_add(&mut self) {
        self.prompt = Some((
            Pending::Add {
                field: AddField::Name,
                draft: StudentDraft::default(),
            },
            TextPrompt::new("Add Student", "Enter student name:"),
        ));
    }

    fn handle_prompt_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(c) => {
                if let Some((_, prompt)) = self.prompt.as_mut() {
                    prompt.input.push(c);
                }
            }
            KeyCode::Backspace => {
                if let Some((_, prompt)) = self.prompt.as_mut() {
                    prompt.input.pop();
                }
            }
            KeyCode::Enter => {
                if let Some((pending, prompt)) = self.prompt.take() {
                    self.submit(pending, Some(prompt.input));
                }
            }
            KeyCode::Esc => {
                if let Some((pending, _)) = self.prompt.take() {
                    self.submit(pending, None);
                }
            }
            _ => {}
        }
    }

    /// `answer` is None when the prompt was cancelled
    fn submit(&mut self, pending: Pending, answer: Option<String>) {
        match pending {
            Pending::Add { field, mut draft } => {
                let cancelled = answer.is_none();
                let next = match field {
                    AddField::Name => {
                        draft.name = answer;
                        Some((AddField::RegNo, "Enter registration number:"))
                    }
                    AddField::RegNo => {
                        draft.reg_no = answer;
                        Some((AddField::Grade, "Enter grade:"))
                    }
                    AddField::Grade => {
                        draft.grade = answer.and_then(|a| a.trim().parse::<f64>().ok());
                        None
                    }
                };

                match next {
                    Some((field, label)) if !cancelled => {
                        self.prompt = Some((Pending::Add { field, draft }, TextPrompt::new("Add Student", label)));
                    }
                    _ => self.finish_add(draft),
                }
            }
            Pending::Search => {
                // A cancelled or blank search does nothing
                let Some(key) = answer.filter(|k| !k.is_empty()) else {
                    return;
                };
                self.notice = Some(match self.store.search(&key) {
                    Ok(student) => found_notice(student),
                    Err(err) => Notice::from(&err),
                });
            }
            Pending::Delete => {
                let reg_no = answer.unwrap_or_default();
                self.notice = Some(match self.store.delete(&reg_no) {
                    Ok(student) => deleted_notice(&student),
                    Err(err) => Notice::from(&err),
                });
                self.clamp_selection();
            }
        }
    }

    fn finish_add(&mut self, draft: StudentDraft) {
        self.notice = Some(match self.store.add(draft) {
            Ok(student) => added_notice(student),
            Err(err) => Notice::from(&err),
        });
        self.clamp_selection();
    }

    fn save(&mut self) {
        self.notice = Some(match &self.csv_path {
            Some(path) => match self.store.save_csv(path) {
                Ok(()) => Notice::info("Saved", format!("{} students written to {}", self.store.len(), path.display())),
                Err(err) => Notice::from(&err),
            },
            None => Notice::warning("Save", "Start with `student-acid records <file.csv>` to enable saving."),
        });
    }

    fn clamp_selection(&mut self) {
        let len = self.store.len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    pub fn next(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.store.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
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
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Records table
            Constraint::Length(3), // Key hints
        ])
        .split(f.size());

    title_bar(
        f,
        chunks[0],
        "📚 Student Record Management System",
        vec![Span::styled(
            format!("Records: {}", app.store.len()),
            Style::default().fg(Color::White),
        )],
    );
    render_table(f, chunks[1], app);
    key_hints(
        f,
        chunks[2],
        &[
            ("a", "Add"),
            ("s", "Search"),
            ("o", "Sort by Grade"),
            ("d", "Delete"),
            ("r", "Refresh"),
            ("w", "Save CSV"),
            ("q", "Exit"),
        ],
    );

    if let Some((_, prompt)) = &app.prompt {
        render_prompt(f, prompt);
    }
    if let Some(notice) = &app.notice {
        render_notice(f, notice);
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Name", "Reg No", "Grade"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.store.students().iter().map(|s| {
        Row::new(vec![
            Cell::from(s.name.clone()),
            Cell::from(s.reg_no.clone()),
            Cell::from(s.grade.to_string()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(16),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Students "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}
