use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::api::ApiClient;
use crate::app::{ApiEvent, App, Command, NoticeLevel};
use crate::dialog::DialogField;
use crate::error::AppError;
use crate::events::{InputEvent, InputReader};
use crate::reconcile::{DragGesture, DragLocation};
use crate::task::TaskStatus;

const KEY_HINTS: &str =
    " q quit | a add | d delete | r refresh | arrows move cursor | space grab/drop | esc cancel ";

/// Screen regions from the last draw, used to map mouse positions to cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub columns: [Rect; 3],
    pub status_bar: Rect,
}

impl BoardLayout {
    pub fn new(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(33),
                Constraint::Percentage(33),
                Constraint::Percentage(34),
            ])
            .split(rows[0]);
        Self {
            columns: [chunks[0], chunks[1], chunks[2]],
            status_bar: rows[1],
        }
    }

    /// Column under `(x, y)` and the list row it points at, counting from the
    /// first task of the column (`offsets` are the lists' scroll offsets).
    pub fn hit_test(&self, offsets: [usize; 3], x: u16, y: u16) -> Option<(TaskStatus, usize)> {
        self.columns.iter().enumerate().find_map(|(i, col)| {
            if !contains(*col, x, y) {
                return None;
            }
            let status = TaskStatus::from_column(i)?;
            let inner = inner(*col);
            let row = y.saturating_sub(inner.y) as usize;
            Some((status, offsets[i] + row))
        })
    }

    /// Like [`hit_test`](Self::hit_test), but only inside a column's border,
    /// so a press on the frame never picks up a card.
    pub fn card_at(&self, offsets: [usize; 3], x: u16, y: u16) -> Option<(TaskStatus, usize)> {
        self.columns
            .iter()
            .any(|col| contains(inner(*col), x, y))
            .then(|| self.hit_test(offsets, x, y))
            .flatten()
    }
}

fn contains(r: Rect, x: u16, y: u16) -> bool {
    x >= r.x && x < r.x.saturating_add(r.width) && y >= r.y && y < r.y.saturating_add(r.height)
}

fn inner(r: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(r)
}

/// Keyboard drag: the card picked up and where it would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grab {
    pub source: DragLocation,
    pub target: DragLocation,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UiAction {
    None,
    Quit,
    Dispatch(Command),
}

impl From<Option<Command>> for UiAction {
    fn from(cmd: Option<Command>) -> Self {
        cmd.map_or(UiAction::None, UiAction::Dispatch)
    }
}

/// View-only state: list scroll positions and in-flight gestures.
#[derive(Debug, Default)]
pub struct BoardUi {
    pub grab: Option<Grab>,
    mouse_source: Option<DragLocation>,
    layout: Option<BoardLayout>,
    lists: [ListState; 3],
}

impl BoardUi {
    fn offsets(&self) -> [usize; 3] {
        [
            self.lists[0].offset(),
            self.lists[1].offset(),
            self.lists[2].offset(),
        ]
    }

    pub fn handle_input(&mut self, app: &mut App, event: InputEvent) -> UiAction {
        match event {
            InputEvent::Key(key) if app.dialog.open => self.dialog_key(app, key),
            InputEvent::Key(key) if self.grab.is_some() => self.grab_key(app, key),
            InputEvent::Key(key) => self.board_key(app, key),
            InputEvent::Mouse(_) if app.dialog.open => UiAction::None,
            InputEvent::Mouse(mouse) => self.mouse(app, mouse),
        }
    }

    fn board_key(&mut self, app: &mut App, key: KeyEvent) -> UiAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return UiAction::Quit;
        }
        match key.code {
            KeyCode::Char('q') => UiAction::Quit,
            KeyCode::Char('a') => {
                app.dialog.open();
                UiAction::None
            }
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected().into(),
            KeyCode::Char('r') => UiAction::Dispatch(app.refresh()),
            KeyCode::Left => {
                app.board.select_column(-1);
                UiAction::None
            }
            KeyCode::Right => {
                app.board.select_column(1);
                UiAction::None
            }
            KeyCode::Up => {
                app.board.select_task(-1);
                UiAction::None
            }
            KeyCode::Down => {
                app.board.select_task(1);
                UiAction::None
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if app.board.selected().is_some() {
                    let source =
                        DragLocation::new(app.board.current_status(), app.board.selected_task);
                    self.grab = Some(Grab {
                        source,
                        target: source,
                    });
                }
                UiAction::None
            }
            _ => UiAction::None,
        }
    }

    fn grab_key(&mut self, app: &mut App, key: KeyEvent) -> UiAction {
        let Some(mut grab) = self.grab else {
            return UiAction::None;
        };
        match key.code {
            KeyCode::Left | KeyCode::Right => {
                let step = if key.code == KeyCode::Left { -1 } else { 1 };
                let column = (grab.target.status.column() as isize + step)
                    .clamp(0, TaskStatus::ALL.len() as isize - 1) as usize;
                let status = TaskStatus::from_column(column).unwrap_or_default();
                let len = app.board.count_by_status(status);
                grab.target = DragLocation::new(status, grab.target.index.min(len));
            }
            KeyCode::Up => grab.target.index = grab.target.index.saturating_sub(1),
            KeyCode::Down => {
                let len = app.board.count_by_status(grab.target.status);
                grab.target.index = (grab.target.index + 1).min(len);
            }
            KeyCode::Esc => {
                self.grab = None;
                return self.finish_drag(app, grab.source, None);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.grab = None;
                return self.finish_drag(app, grab.source, Some(grab.target));
            }
            _ => {}
        }
        self.grab = Some(grab);
        UiAction::None
    }

    fn dialog_key(&mut self, app: &mut App, key: KeyEvent) -> UiAction {
        let dialog = &mut app.dialog;
        match key.code {
            KeyCode::Esc => dialog.close(),
            KeyCode::Tab | KeyCode::Down => dialog.focus_next(),
            KeyCode::BackTab | KeyCode::Up => dialog.focus_prev(),
            KeyCode::Left if dialog.focus == DialogField::Status => dialog.cycle_status(-1),
            KeyCode::Right if dialog.focus == DialogField::Status => dialog.cycle_status(1),
            KeyCode::Backspace => dialog.backspace(),
            KeyCode::Enter => return app.submit_dialog().into(),
            KeyCode::Char(c) => dialog.push_char(c),
            _ => {}
        }
        UiAction::None
    }

    fn mouse(&mut self, app: &mut App, mouse: MouseEvent) -> UiAction {
        let Some(layout) = self.layout else {
            return UiAction::None;
        };
        let offsets = self.offsets();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.mouse_source = layout
                    .card_at(offsets, mouse.column, mouse.row)
                    .filter(|(status, index)| *index < app.board.count_by_status(*status))
                    .map(|(status, index)| DragLocation::new(status, index));
                if let Some(source) = self.mouse_source {
                    app.board.focus(source.status, source.index);
                }
                UiAction::None
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some(source) = self.mouse_source.take() else {
                    return UiAction::None;
                };
                let hit = layout.hit_test(offsets, mouse.column, mouse.row);
                let destination = hit.map(|(status, index)| {
                    DragLocation::new(status, index.min(app.board.count_by_status(status)))
                });
                self.finish_drag(app, source, destination)
            }
            _ => UiAction::None,
        }
    }

    fn finish_drag(
        &mut self,
        app: &mut App,
        source: DragLocation,
        destination: Option<DragLocation>,
    ) -> UiAction {
        let command = app.drag_end(DragGesture {
            source,
            destination,
        });
        if let Some(Command::UpdateStatus { id, status }) = &command {
            let index = app
                .board
                .get_tasks_by_status(*status)
                .iter()
                .position(|t| &t.id == id)
                .unwrap_or(0);
            app.board.focus(*status, index);
        }
        command.into()
    }
}

pub fn draw(f: &mut Frame, app: &App, ui: &mut BoardUi) {
    let layout = BoardLayout::new(f.area());
    ui.layout = Some(layout);

    for (i, status) in TaskStatus::ALL.iter().enumerate() {
        let tasks = app.board.get_tasks_by_status(*status);
        let grabbed = ui.grab.filter(|g| g.source.status == *status).map(|g| g.source.index);
        let items: Vec<ListItem> = tasks
            .iter()
            .enumerate()
            .map(|(idx, t)| {
                let title_style = if grabbed == Some(idx) {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                };
                let mut spans = vec![
                    Span::styled(&t.title, title_style),
                    Span::raw("  "),
                    Span::styled(&t.description, Style::default().fg(Color::DarkGray)),
                ];
                if app.is_pending(&t.id) {
                    spans.push(Span::styled(" (saving)", Style::default().fg(Color::Yellow)));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let mut title = format!(" {} ({}) ", status.label(), tasks.len());
        let drop_target = ui.grab.filter(|g| g.target.status == *status);
        if let Some(g) = drop_target {
            title.push_str(&format!("drop at {} ", g.target.index + 1));
        }
        let border_style = if drop_target.is_some() {
            Style::default().fg(Color::Yellow)
        } else if app.board.selected_status == i {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_style(border_style),
            )
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let state = &mut ui.lists[i];
        if app.board.selected_status == i && !tasks.is_empty() {
            state.select(Some(app.board.selected_task));
        } else {
            state.select(None);
        }
        f.render_stateful_widget(list, layout.columns[i], state);
    }

    let status_line = match app.notice() {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Error => Color::Red,
            };
            Line::from(Span::styled(
                format!(" {} ", notice.message),
                Style::default().fg(color),
            ))
        }
        None => Line::from(Span::styled(KEY_HINTS, Style::default().fg(Color::DarkGray))),
    };
    f.render_widget(Paragraph::new(status_line), layout.status_bar);

    if app.dialog.open {
        draw_dialog(f, app);
    }
}

fn draw_dialog(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 60, 11);
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(" New task (enter submit, esc cancel) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let body = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(body);

    let dialog = &app.dialog;
    let fields = [
        (DialogField::Title, "Title", dialog.title.clone()),
        (DialogField::Description, "Description", dialog.description.clone()),
        (
            DialogField::Status,
            "Status",
            format!("< {} >", dialog.status.label()),
        ),
    ];
    for (row, (field, label, value)) in rows.iter().zip(fields) {
        let style = if dialog.focus == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let input = Paragraph::new(value).block(
            Block::default()
                .title(label)
                .borders(Borders::ALL)
                .border_style(style),
        );
        f.render_widget(input, *row);
    }
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Drive the board until the user quits. Network calls run on the runtime and
/// report back through a channel, so they never block input handling.
pub async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    api: &ApiClient,
    tick: Duration,
) -> Result<(), AppError> {
    let (input, mut input_rx) = InputReader::start();
    let (api_tx, mut api_rx) = mpsc::unbounded_channel::<ApiEvent>();
    let dispatch = |command: Command| {
        let api = api.clone();
        let tx = api_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(command.execute(&api).await);
        });
    };

    dispatch(app.refresh());
    let mut ui = BoardUi::default();
    let mut ticker = tokio::time::interval(tick);

    let result = loop {
        if let Err(err) = terminal.draw(|f| draw(f, app, &mut ui)) {
            break Err(AppError::from(err));
        }

        tokio::select! {
            Some(event) = input_rx.recv() => match ui.handle_input(app, event) {
                UiAction::Quit => break Ok(()),
                UiAction::Dispatch(command) => dispatch(command),
                UiAction::None => {}
            },
            Some(event) = api_rx.recv() => app.apply(event),
            _ = ticker.tick() => app.expire_notice(Local::now()),
        }
    };

    input.stop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::task;
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> InputEvent {
        InputEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn app() -> App {
        let mut app = App::new(5);
        app.board.set_all(vec![
            task("A", TaskStatus::ToDo),
            task("B", TaskStatus::ToDo),
            task("C", TaskStatus::InProgress),
        ]);
        app
    }

    fn render(app: &App, ui: &mut BoardUi) -> String {
        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        terminal.draw(|f| draw(f, app, ui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn hit_test_maps_rows_to_cards() {
        let layout = BoardLayout::new(Rect::new(0, 0, 90, 20));
        assert_eq!(layout.hit_test([0; 3], 5, 1), Some((TaskStatus::ToDo, 0)));
        assert_eq!(layout.hit_test([0; 3], 5, 3), Some((TaskStatus::ToDo, 2)));
        assert_eq!(layout.hit_test([4, 0, 0], 5, 1), Some((TaskStatus::ToDo, 4)));
        assert_eq!(
            layout.hit_test([0; 3], 40, 1).map(|(s, _)| s),
            Some(TaskStatus::InProgress)
        );
        assert_eq!(layout.hit_test([0; 3], 5, 19), None);
    }

    #[test]
    fn border_press_is_not_a_card() {
        let layout = BoardLayout::new(Rect::new(0, 0, 90, 20));
        assert_eq!(layout.card_at([0; 3], 5, 0), None);
        assert_eq!(layout.card_at([0; 3], 0, 1), None);
        assert_eq!(layout.card_at([0; 3], 5, 1), Some((TaskStatus::ToDo, 0)));
        // Drops on the frame still land in the column.
        assert_eq!(layout.hit_test([0; 3], 5, 0), Some((TaskStatus::ToDo, 0)));
    }

    #[test]
    fn mouse_press_on_border_starts_no_drag() {
        let mut app = app();
        let mut ui = BoardUi::default();
        render(&app, &mut ui);

        ui.handle_input(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 0));
        let action = ui.handle_input(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 40, 8));
        assert_eq!(action, UiAction::None);
        assert_eq!(app.board.count_by_status(TaskStatus::ToDo), 2);
    }

    #[test]
    fn centered_handles_very_wide_terminals() {
        let area = Rect::new(0, 0, 2000, 50);
        let popup = centered(area, 60, 11);
        assert_eq!(popup.width, 1200);
        assert_eq!(popup.x, 400);
        assert_eq!(popup.height, 11);
    }

    #[test]
    fn renders_column_counts() {
        let app = app();
        let screen = render(&app, &mut BoardUi::default());
        assert!(screen.contains("To Do (2)"));
        assert!(screen.contains("In Progress (1)"));
        assert!(screen.contains("Done (0)"));
    }

    #[test]
    fn keyboard_grab_and_drop_moves_task() {
        let mut app = app();
        let mut ui = BoardUi::default();

        assert_eq!(ui.handle_input(&mut app, key(KeyCode::Char(' '))), UiAction::None);
        ui.handle_input(&mut app, key(KeyCode::Right));
        ui.handle_input(&mut app, key(KeyCode::Right));
        let action = ui.handle_input(&mut app, key(KeyCode::Enter));

        assert_eq!(
            action,
            UiAction::Dispatch(Command::UpdateStatus {
                id: crate::task::TaskId::new("A"),
                status: TaskStatus::Done,
            })
        );
        assert_eq!(app.board.current_status(), TaskStatus::Done);
        assert_eq!(app.board.selected().unwrap().id.as_str(), "A");
    }

    #[test]
    fn escape_abandons_grab() {
        let mut app = app();
        let mut ui = BoardUi::default();
        ui.handle_input(&mut app, key(KeyCode::Char(' ')));
        ui.handle_input(&mut app, key(KeyCode::Right));
        assert_eq!(ui.handle_input(&mut app, key(KeyCode::Esc)), UiAction::None);
        assert!(ui.grab.is_none());
        assert_eq!(app.board.count_by_status(TaskStatus::ToDo), 2);
    }

    #[test]
    fn mouse_drag_between_columns() {
        let mut app = app();
        let mut ui = BoardUi::default();
        render(&app, &mut ui);

        ui.handle_input(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 2));
        let action = ui.handle_input(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 40, 8));
        assert_eq!(
            action,
            UiAction::Dispatch(Command::UpdateStatus {
                id: crate::task::TaskId::new("B"),
                status: TaskStatus::InProgress,
            })
        );
    }

    #[test]
    fn mouse_release_off_board_is_abandoned() {
        let mut app = app();
        let mut ui = BoardUi::default();
        render(&app, &mut ui);

        ui.handle_input(&mut app, mouse(MouseEventKind::Down(MouseButton::Left), 5, 1));
        let action = ui.handle_input(&mut app, mouse(MouseEventKind::Up(MouseButton::Left), 5, 19));
        assert_eq!(action, UiAction::None);
        assert_eq!(app.board.count_by_status(TaskStatus::ToDo), 2);
    }

    #[test]
    fn dialog_captures_typing() {
        let mut app = app();
        let mut ui = BoardUi::default();
        ui.handle_input(&mut app, key(KeyCode::Char('a')));
        assert!(app.dialog.open);

        ui.handle_input(&mut app, key(KeyCode::Char('q')));
        assert!(app.dialog.open);
        assert_eq!(app.dialog.title, "q");

        let action = ui.handle_input(&mut app, key(KeyCode::Enter));
        assert_eq!(action, UiAction::None);
        assert!(app.notice().is_some());
    }
}
