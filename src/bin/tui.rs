use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{Local, Utc};
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, ListState, Wrap}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}, text::Line};

use tasklist::{
    application::task_service::TaskServiceImpl,
    client::{api::{HttpTaskApi, LocalTaskApi, TaskApi}, controller::TaskController},
    config::Config,
    domain::{icon::{icon_color, next_icon, prev_icon}, repository::TaskRepository, task::Task},
    infrastructure::sqlite_repo::{prepare_sqlite_file, SqliteTaskRepository},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    match config.api_url.clone() {
        Some(url) => run(HttpTaskApi::new(url), &config).await,
        None => {
            prepare_sqlite_file(&config.database_url)?;
            let repo = SqliteTaskRepository::connect(&config.database_url).await?;
            repo.init().await?;
            run(LocalTaskApi::new(TaskServiceImpl::new(repo)), &config).await
        }
    }
}

async fn run<A: TaskApi>(api: A, config: &Config) -> Result<()> {
    let source = config.api_url.clone().unwrap_or_else(|| config.database_url.clone());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, TaskController::new(api), source).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Add, Edit }

#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveField { Title, Note, Icon, Start, End }

impl ActiveField {
    const ALL: [ActiveField; 5] = [ActiveField::Title, ActiveField::Note, ActiveField::Icon, ActiveField::Start, ActiveField::End];

    fn label(self) -> &'static str {
        match self {
            ActiveField::Title => "Title",
            ActiveField::Note => "Note",
            ActiveField::Icon => "Icon",
            ActiveField::Start => "Start",
            ActiveField::End => "End",
        }
    }

    fn step(self, forward: bool) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        let n = Self::ALL.len();
        Self::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }]
    }
}

struct App<A: TaskApi> {
    controller: TaskController<A>,
    cursor: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    field: ActiveField,
    message: Option<String>,
    source: String,
}

impl<A: TaskApi> App<A> {
    fn task_at_cursor(&self) -> Option<Task> {
        self.controller.state().tasks().get(self.cursor).cloned()
    }

    fn clamp_cursor(&mut self) {
        let len = self.controller.state().tasks().len();
        if len == 0 { self.cursor = 0; self.list_state.select(None); }
        else { if self.cursor >= len { self.cursor = len - 1; } self.list_state.select(Some(self.cursor)); }
    }

    /// Records the outcome of a store call for the footer.
    fn report(&mut self, result: Result<()>) {
        self.message = match result {
            Err(e) => Some(format!("error: {e:#}")),
            Ok(()) if self.controller.is_stale() => Some("saved, but the list could not be reloaded (r to retry)".to_string()),
            Ok(()) => None,
        };
        self.clamp_cursor();
    }

    fn edit_char(&mut self, c: Option<char>) {
        let draft = self.controller.state_mut().draft_mut();
        let target = match self.field {
            ActiveField::Title => &mut draft.title,
            ActiveField::Note => &mut draft.note,
            ActiveField::Start => &mut draft.start,
            ActiveField::End => &mut draft.end,
            ActiveField::Icon => return,
        };
        match c {
            Some(c) => target.push(c),
            None => { target.pop(); }
        }
    }
}

fn hex_color(hex: &str) -> Color {
    Color::from_str(hex).unwrap_or(Color::Magenta)
}

fn list_line(task: &Task) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let mut line = format!("{} {} {}", mark, task.icon, task.title);
    if let (Some(start), Some(_)) = (task.start_date, task.end_date) {
        line.push_str(&format!("  📅 {}", start.with_timezone(&Local).format("%H:%M %d/%m")));
    }
    if let Some(note) = task.note.as_deref().filter(|n| !n.is_empty()) {
        let preview: String = note.chars().take(30).collect();
        let ellipsis = if note.chars().count() > 30 { "..." } else { "" };
        line.push_str(&format!("  {preview}{ellipsis}"));
    }
    line
}

async fn run_app<A: TaskApi>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, controller: TaskController<A>, source: String) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { controller, cursor: 0, last_tick: Instant::now(), mode: Mode::View, list_state: ListState::default(), field: ActiveField::Title, message: None, source };
    let loaded = app.controller.refresh().await;
    app.report(loaded);

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Tasks (Enter: open, Space: toggle, n: new, d: delete, r: reload, q: quit)  |  Form: Tab to move, ←/→ icon, Enter to save, Esc to close")
                .block(Block::default().borders(Borders::ALL).title("tasklist"));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.controller.state().tasks().iter().map(|t| {
                let style = Style::default().fg(hex_color(TaskController::<A>::color_of(t)));
                let style = if t.completed { style.add_modifier(Modifier::CROSSED_OUT) } else { style };
                ListItem::new(list_line(t)).style(style)
            }).collect();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("tasks [{}]", app.controller.state().tasks().len())))
                .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail_title = match app.mode { Mode::View => "details", Mode::Add => "new task", Mode::Edit => "task details" };
            if app.mode == Mode::View {
                let hint = Paragraph::new("Open a task with Enter or add one with n")
                    .block(Block::default().borders(Borders::ALL).title(detail_title));
                f.render_widget(hint, middle[1]);
            } else {
                let progress = if app.mode == Mode::Edit { app.controller.selected_progress(Utc::now()) } else { None };
                let detail_chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(1), Constraint::Length(if progress.is_some() { 3 } else { 0 })])
                    .split(middle[1]);

                let draft = app.controller.state().draft();
                let lines: Vec<Line> = ActiveField::ALL.iter().map(|field| {
                    let value = match field {
                        ActiveField::Title => draft.title.as_str(),
                        ActiveField::Note => draft.note.as_str(),
                        ActiveField::Icon => draft.icon.as_str(),
                        ActiveField::Start => draft.start.as_str(),
                        ActiveField::End => draft.end.as_str(),
                    };
                    let cursor = if *field == app.field && *field != ActiveField::Icon { "_" } else { "" };
                    let text = format!("{:<6} {}{}", field.label(), value, cursor);
                    if *field == app.field { Line::styled(text, Style::default().add_modifier(Modifier::REVERSED)) } else { Line::raw(text) }
                }).collect();
                let form = Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title(detail_title).border_style(Style::default().fg(hex_color(icon_color(&draft.icon)))));
                f.render_widget(form, detail_chunks[0]);

                if let Some(percent) = progress {
                    let gauge = Gauge::default()
                        .block(Block::default().borders(Borders::ALL).title("time elapsed"))
                        .gauge_style(Style::default().fg(Color::Yellow))
                        .percent(u16::from(percent));
                    f.render_widget(gauge, detail_chunks[1]);
                }
            }

            let footer_text = match &app.message {
                Some(message) => message.clone(),
                None => format!("source={}  |  dates as YYYY-MM-DDTHH:MM local time", app.source),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Add => "add", Mode::Edit => "edit" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.cursor > 0 { app.cursor -= 1; } app.clamp_cursor(); }
                        KeyCode::Down => { app.cursor += 1; app.clamp_cursor(); }
                        KeyCode::Enter => {
                            if let Some(task) = app.task_at_cursor() {
                                app.controller.select(task);
                                app.mode = Mode::Edit;
                                app.field = ActiveField::Title;
                            }
                        }
                        KeyCode::Char(' ') => {
                            if let Some(task) = app.task_at_cursor() {
                                let res = app.controller.toggle(task.id).await;
                                app.report(res);
                            }
                        }
                        KeyCode::Char('n') => {
                            app.controller.start_add();
                            app.mode = Mode::Add;
                            app.field = ActiveField::Title;
                        }
                        KeyCode::Char('d') => {
                            if let Some(task) = app.task_at_cursor() {
                                let res = app.controller.remove(task.id).await;
                                app.report(res);
                            }
                        }
                        KeyCode::Char('r') => {
                            let res = app.controller.refresh().await;
                            app.report(res);
                        }
                        _ => {}
                    },
                    Mode::Add | Mode::Edit => match key.code {
                        KeyCode::Esc => { app.controller.cancel(); app.mode = Mode::View; app.message = None; }
                        KeyCode::Enter => {
                            let res = app.controller.save().await;
                            let saved = res.is_ok();
                            app.report(res);
                            if saved && (app.mode == Mode::Add || !app.controller.state().is_editing()) {
                                app.mode = Mode::View;
                            }
                        }
                        KeyCode::Tab => { app.field = app.field.step(true); }
                        KeyCode::BackTab => { app.field = app.field.step(false); }
                        KeyCode::Left if app.field == ActiveField::Icon => {
                            let draft = app.controller.state_mut().draft_mut();
                            draft.icon = prev_icon(&draft.icon).to_string();
                        }
                        KeyCode::Right if app.field == ActiveField::Icon => {
                            let draft = app.controller.state_mut().draft_mut();
                            draft.icon = next_icon(&draft.icon).to_string();
                        }
                        KeyCode::Backspace => app.edit_char(None),
                        KeyCode::Char(c) => app.edit_char(Some(c)),
                        _ => {}
                    },
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
