use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    crossterm::{
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use std::io;
use tokio::task::JoinHandle;

use todo_core::{NewTask, Priority, SortMode, Task, TaskPatch};

use crate::api::TodoClient;
use crate::due::{self, DueBadge};
use crate::state::{EditDraft, TodoList};

#[derive(Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Creating,
    Editing,
    DueDate,
    DeleteConfirm,
    Help,
}

pub struct App {
    pub client: TodoClient,
    pub todos: TodoList,
    pub task_state: ListState,
    pub sort: SortMode,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub draft: Option<EditDraft>,
    pub delete_target: Option<(i64, String)>,
    pub status: Option<String>,
    pending_reorder: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(client: TodoClient) -> Self {
        Self {
            client,
            todos: TodoList::default(),
            task_state: ListState::default(),
            sort: SortMode::Default,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            draft: None,
            delete_target: None,
            status: None,
            pending_reorder: None,
        }
    }

    pub async fn load_tasks(&mut self) -> Result<()> {
        self.fetch(self.sort).await
    }

    /// Switches to the next sort mode once its list has been fetched.
    pub async fn cycle_sort(&mut self) -> Result<()> {
        self.fetch(self.sort.next()).await
    }

    async fn fetch(&mut self, sort: SortMode) -> Result<()> {
        // An in-flight reorder must land before the server order is read back.
        self.flush().await;

        let tasks = self
            .client
            .list(sort)
            .await
            .context("Error fetching todos")?;
        self.sort = sort;
        self.todos.replace(tasks);
        self.clamp_selection();
        Ok(())
    }

    fn selected_task(&self) -> Option<&Task> {
        self.task_state.selected().and_then(|i| self.todos.get(i))
    }

    fn clamp_selection(&mut self) {
        let selection = match (self.task_state.selected(), self.todos.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.task_state.select(selection);
    }

    pub fn next_task(&mut self) {
        if self.todos.is_empty() {
            return;
        }
        let i = match self.task_state.selected() {
            Some(i) if i + 1 < self.todos.len() => i + 1,
            _ => 0,
        };
        self.task_state.select(Some(i));
    }

    pub fn previous_task(&mut self) {
        if self.todos.is_empty() {
            return;
        }
        let i = match self.task_state.selected() {
            Some(0) | None => self.todos.len() - 1,
            Some(i) => i - 1,
        };
        self.task_state.select(Some(i));
    }

    pub fn start_creating(&mut self) {
        self.input_buffer.clear();
        self.input_mode = InputMode::Creating;
    }

    /// Submits the input line. On failure the line stays open for a retry.
    pub async fn finish_creating(&mut self) -> Result<()> {
        let text = self.input_buffer.trim().to_string();
        if text.is_empty() {
            self.cancel_input();
            return Ok(());
        }

        let task = self
            .client
            .create(&NewTask::new(text))
            .await
            .context("Error adding todo")?;
        self.cancel_input();
        self.todos.push(task);
        self.task_state.select(Some(self.todos.len() - 1));
        Ok(())
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    async fn update_selected(&mut self, patch: TaskPatch, action: &'static str) -> Result<()> {
        let Some(task_id) = self.selected_task().map(|t| t.id) else {
            return Ok(());
        };

        let updated = self
            .client
            .update(task_id, &patch)
            .await
            .context(action)?;
        self.todos.apply(updated);
        Ok(())
    }

    pub async fn toggle_selected(&mut self) -> Result<()> {
        let Some(completed) = self.selected_task().map(|t| t.completed) else {
            return Ok(());
        };

        let patch = TaskPatch {
            completed: Some(!completed),
            ..TaskPatch::default()
        };
        self.update_selected(patch, "Error toggling todo").await
    }

    pub async fn cycle_priority(&mut self) -> Result<()> {
        let Some(priority) = self.selected_task().map(|t| t.priority) else {
            return Ok(());
        };

        let patch = TaskPatch {
            priority: Some(priority.next()),
            ..TaskPatch::default()
        };
        self.update_selected(patch, "Error changing priority").await
    }

    pub fn start_due_date(&mut self) {
        let Some(task) = self.selected_task() else {
            return;
        };
        self.input_buffer = task
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        self.input_mode = InputMode::DueDate;
    }

    pub async fn finish_due_date(&mut self) -> Result<()> {
        let entry = self.input_buffer.trim().to_string();
        let due_date = if entry.is_empty() {
            None
        } else {
            let date = NaiveDate::parse_from_str(&entry, "%Y-%m-%d")
                .map_err(|_| anyhow!("'{entry}' is not a YYYY-MM-DD date"))?;
            Some(date)
        };

        let patch = TaskPatch {
            due_date: Some(due_date),
            ..TaskPatch::default()
        };
        self.update_selected(patch, "Error setting due date").await?;
        self.cancel_input();
        Ok(())
    }

    pub fn start_edit(&mut self) {
        if let Some(task) = self.selected_task() {
            self.draft = Some(EditDraft::begin(task));
            self.input_mode = InputMode::Editing;
        }
    }

    /// Saves the draft. A blank draft stays open.
    pub async fn save_edit(&mut self) -> Result<()> {
        let Some(draft) = &self.draft else {
            self.cancel_edit();
            return Ok(());
        };
        let Some(text) = draft.submission() else {
            return Ok(());
        };

        let task_id = draft.task_id;
        let patch = TaskPatch {
            text: Some(text.to_string()),
            ..TaskPatch::default()
        };
        let updated = self
            .client
            .update(task_id, &patch)
            .await
            .context("Error updating todo")?;
        self.todos.apply(updated);
        self.cancel_edit();
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn start_delete_confirm(&mut self) {
        if let Some(task) = self.selected_task() {
            self.delete_target = Some((task.id, task.text.clone()));
            self.input_mode = InputMode::DeleteConfirm;
        }
    }

    pub async fn confirm_delete(&mut self) -> Result<()> {
        let target = self.delete_target.take();
        self.input_mode = InputMode::Normal;
        let Some((task_id, _)) = target else {
            return Ok(());
        };

        self.client
            .delete(task_id)
            .await
            .context("Error deleting todo")?;
        self.todos.remove(task_id);
        self.clamp_selection();
        Ok(())
    }

    pub fn cancel_delete_confirm(&mut self) {
        self.input_mode = InputMode::Normal;
        self.delete_target = None;
    }

    pub fn move_selected_up(&mut self) {
        if let Some(index) = self.task_state.selected() {
            if let Some(new_index) = self.todos.move_up(index) {
                self.task_state.select(Some(new_index));
                self.push_order();
            }
        }
    }

    pub fn move_selected_down(&mut self) {
        if let Some(index) = self.task_state.selected() {
            if let Some(new_index) = self.todos.move_down(index) {
                self.task_state.select(Some(new_index));
                self.push_order();
            }
        }
    }

    /// Sends the local order in the background. Pushes are chained so they
    /// reach the server in the order they were made. A failed push is only
    /// logged; the local order is kept.
    fn push_order(&mut self) {
        let client = self.client.clone();
        let task_ids = self.todos.ids();
        let previous = self.pending_reorder.take();

        self.pending_reorder = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            if let Err(err) = client.reorder(&task_ids).await {
                tracing::error!(error = %err, "Error reordering todos");
            }
        }));
    }

    pub async fn flush(&mut self) {
        if let Some(pending) = self.pending_reorder.take() {
            let _ = pending.await;
        }
    }

    pub fn report(&mut self, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.status = Some(format!("{err:#}"));
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn hide_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }
}

pub async fn run_app(client: TodoClient) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client);
    if let Err(err) = app.load_tasks().await {
        app.report(err);
    }

    let res = run_app_loop(&mut terminal, &mut app).await;
    app.flush().await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

async fn run_app_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let result = match app.input_mode {
            InputMode::Normal => {
                app.status = None;
                match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => {
                        app.next_task();
                        Ok(())
                    }
                    KeyCode::Up | KeyCode::Char('k') => {
                        app.previous_task();
                        Ok(())
                    }
                    KeyCode::Char('K') => {
                        app.move_selected_up();
                        Ok(())
                    }
                    KeyCode::Char('J') => {
                        app.move_selected_down();
                        Ok(())
                    }
                    KeyCode::Char('a') => {
                        app.start_creating();
                        Ok(())
                    }
                    KeyCode::Char('r') => {
                        app.start_edit();
                        Ok(())
                    }
                    KeyCode::Char('d') => {
                        app.start_due_date();
                        Ok(())
                    }
                    KeyCode::Char('D') => {
                        app.start_delete_confirm();
                        Ok(())
                    }
                    KeyCode::Char('?') => {
                        app.show_help();
                        Ok(())
                    }
                    KeyCode::Char('c') | KeyCode::Char(' ') => app.toggle_selected().await,
                    KeyCode::Char('p') => app.cycle_priority().await,
                    KeyCode::Char('s') => app.cycle_sort().await,
                    KeyCode::Char('g') => app.load_tasks().await,
                    _ => Ok(()),
                }
            }
            InputMode::Creating | InputMode::DueDate => match key.code {
                KeyCode::Enter if app.input_mode == InputMode::Creating => {
                    app.finish_creating().await
                }
                KeyCode::Enter => app.finish_due_date().await,
                KeyCode::Esc => {
                    app.cancel_input();
                    Ok(())
                }
                KeyCode::Backspace => {
                    app.input_buffer.pop();
                    Ok(())
                }
                KeyCode::Char(c) => {
                    app.input_buffer.push(c);
                    Ok(())
                }
                _ => Ok(()),
            },
            InputMode::Editing => match key.code {
                KeyCode::Enter => app.save_edit().await,
                KeyCode::Esc => {
                    app.cancel_edit();
                    Ok(())
                }
                KeyCode::Backspace => {
                    if let Some(draft) = app.draft.as_mut() {
                        draft.text.pop();
                    }
                    Ok(())
                }
                KeyCode::Char(c) => {
                    if let Some(draft) = app.draft.as_mut() {
                        draft.text.push(c);
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
            InputMode::DeleteConfirm => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete().await,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.cancel_delete_confirm();
                    Ok(())
                }
                _ => Ok(()),
            },
            InputMode::Help => {
                if matches!(
                    key.code,
                    KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')
                ) {
                    app.hide_help();
                }
                Ok(())
            }
        };

        if let Err(err) = result {
            app.report(err);
        }
    }
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Mid => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
        Priority::None => Style::default().fg(Color::DarkGray),
    }
}

fn badge_style(badge: DueBadge) -> Style {
    match badge {
        DueBadge::Overdue => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        DueBadge::Today => Style::default().fg(Color::Magenta),
        DueBadge::Urgent => Style::default().fg(Color::Yellow),
        DueBadge::Normal => Style::default().fg(Color::DarkGray),
    }
}

fn task_line(task: &Task, today: NaiveDate) -> Line<'static> {
    let checkbox = if task.completed { "×" } else { " " };
    let text_style = if task.completed {
        Style::default()
            .add_modifier(Modifier::CROSSED_OUT)
            .fg(Color::DarkGray)
    } else {
        Style::default()
    };

    let mut spans = vec![Span::styled(
        format!("[{checkbox}] {}", task.text),
        text_style,
    )];
    if task.priority != Priority::None {
        spans.push(Span::styled(
            format!(" !{}", task.priority.as_str()),
            priority_style(task.priority),
        ));
    }
    if let Some(due_date) = task.due_date {
        spans.push(Span::styled(
            format!(" ({})", due::describe(due_date, today)),
            badge_style(due::badge(due_date, today)),
        ));
    }

    Line::from(spans)
}

fn ui(f: &mut Frame, app: &mut App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    let today = Local::now().date_naive();
    let task_items: Vec<ListItem> = if app.todos.is_empty() {
        vec![ListItem::new(Span::styled(
            "nothing to do! press a to add a todo",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.todos
            .tasks()
            .iter()
            .map(|task| ListItem::new(task_line(task, today)))
            .collect()
    };

    let title = format!("todos · sort: {}", app.sort.as_param());
    let tasks = List::new(task_items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol(">> ");

    f.render_stateful_widget(tasks, main_chunks[0], &mut app.task_state);

    match app.input_mode {
        InputMode::Creating => {
            input_popup(f, "new todo", &app.input_buffer, Color::Green);
        }
        InputMode::Editing => {
            let text = app.draft.as_ref().map_or("", |d| d.text.as_str());
            input_popup(f, "edit todo", text, Color::Yellow);
        }
        InputMode::DueDate => {
            input_popup(
                f,
                "due date (YYYY-MM-DD, empty clears)",
                &app.input_buffer,
                Color::Cyan,
            );
        }
        InputMode::DeleteConfirm => {
            let popup_area = centered_rect(60, 20, f.area());
            f.render_widget(Clear, popup_area);

            let target_name = app
                .delete_target
                .as_ref()
                .map_or("item", |(_, text)| text.as_str());
            let confirm_text = format!("Delete '{target_name}'?\n\ny: confirm | n/esc: cancel");
            let confirm = Paragraph::new(confirm_text)
                .block(
                    Block::default()
                        .title("confirm delete")
                        .borders(Borders::ALL),
                )
                .style(Style::default().fg(Color::Red));
            f.render_widget(confirm, popup_area);
        }
        InputMode::Help => {
            let popup_area = centered_rect(80, 60, f.area());
            f.render_widget(Clear, popup_area);

            let help_text = r#"Navigation:
  j/k: move selection down/up
  J/K: move selected todo down/up
  s: cycle sort (default, priority, due date)
  g: reload from the server

Actions:
  a: add todo
  r: edit text (enter saves, esc cancels)
  c/space: complete/uncomplete
  p: cycle priority (none, low, mid, high)
  d: set or clear due date
  D: delete selected todo
  ?: show/hide this help
  q: quit

Press ? or ESC to close"#;
            let help = Paragraph::new(help_text)
                .block(Block::default().title("help").borders(Borders::ALL))
                .style(Style::default().fg(Color::White));
            f.render_widget(help, popup_area);
        }
        InputMode::Normal => {}
    }

    let status_bar = match &app.status {
        Some(message) => Paragraph::new(message.as_str())
            .style(Style::default().fg(Color::White).bg(Color::Red)),
        None => Paragraph::new("q: quit | ?: help")
            .style(Style::default().fg(Color::White).bg(Color::DarkGray)),
    };
    f.render_widget(status_bar, main_chunks[1]);
}

fn input_popup(f: &mut Frame, title: &str, text: &str, color: Color) {
    let popup_area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, popup_area);

    let input = Paragraph::new(text)
        .block(Block::default().title(title).borders(Borders::ALL))
        .style(Style::default().fg(color));
    f.render_widget(input, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
