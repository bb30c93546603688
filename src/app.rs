//! Board controller: user intents in, API commands out, API results applied.
//!
//! Every intent that needs the server returns a [`Command`]. Running the
//! command yields an [`ApiEvent`] which goes back through [`App::apply`], so
//! all store mutations happen on the caller's thread in event order.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Local};

use crate::api::ApiClient;
use crate::dialog::CreateDialog;
use crate::error::TransportError;
use crate::kanban_board::KanbanBoard;
use crate::reconcile::{reconcile, DragGesture};
use crate::task::{NewTask, Task, TaskId, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Create(NewTask),
    UpdateStatus { id: TaskId, status: TaskStatus },
    Delete(TaskId),
}

impl Command {
    pub async fn execute(self, api: &ApiClient) -> ApiEvent {
        match self {
            Self::List => ApiEvent::Loaded(api.list_tasks().await),
            Self::Create(new_task) => ApiEvent::Created(api.create_task(&new_task).await),
            Self::UpdateStatus { id, status } => {
                let result = api.update_status(&id, status).await;
                ApiEvent::StatusUpdated { id, result }
            }
            Self::Delete(id) => {
                let result = api.delete_task(&id).await;
                ApiEvent::Deleted { id, result }
            }
        }
    }
}

#[derive(Debug)]
pub enum ApiEvent {
    Loaded(Result<Vec<Task>, TransportError>),
    Created(Result<Task, TransportError>),
    StatusUpdated {
        id: TaskId,
        result: Result<Task, TransportError>,
    },
    Deleted {
        id: TaskId,
        result: Result<(), TransportError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient status-bar message.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub raised_at: DateTime<Local>,
}

pub struct App {
    pub board: KanbanBoard,
    pub dialog: CreateDialog,
    notice: Option<Notice>,
    notice_ttl: Duration,
    /// Moves awaiting server confirmation, keyed by task, holding the status
    /// the task had before the move.
    pending_moves: HashMap<TaskId, TaskStatus>,
}

impl App {
    pub fn new(notice_ttl_secs: u64) -> Self {
        Self {
            board: KanbanBoard::new(),
            dialog: CreateDialog::default(),
            notice: None,
            notice_ttl: Duration::seconds(notice_ttl_secs as i64),
            pending_moves: HashMap::new(),
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_pending(&self, id: &TaskId) -> bool {
        self.pending_moves.contains_key(id)
    }

    fn info(&mut self, message: impl Into<String>) {
        self.raise(message.into(), NoticeLevel::Info);
    }

    fn error(&mut self, message: impl Into<String>) {
        self.raise(message.into(), NoticeLevel::Error);
    }

    fn raise(&mut self, message: String, level: NoticeLevel) {
        self.notice = Some(Notice {
            message,
            level,
            raised_at: Local::now(),
        });
    }

    /// Drop the notice once it has been visible for the configured TTL.
    pub fn expire_notice(&mut self, now: DateTime<Local>) {
        if let Some(notice) = &self.notice {
            if now - notice.raised_at >= self.notice_ttl {
                self.notice = None;
            }
        }
    }

    pub fn refresh(&self) -> Command {
        tracing::debug!(target: "kanban.board", "refresh requested");
        Command::List
    }

    /// Validate the dialog and, when it passes, request creation. The dialog
    /// stays open until the server answers.
    pub fn submit_dialog(&mut self) -> Option<Command> {
        match self.dialog.validate() {
            Ok(new_task) => Some(Command::Create(new_task)),
            Err(err) => {
                tracing::debug!(target: "kanban.board", error = %err, "dialog rejected");
                self.error(capitalize(&err.to_string()));
                None
            }
        }
    }

    pub fn delete_selected(&mut self) -> Option<Command> {
        let id = self.board.selected()?.id.clone();
        Some(Command::Delete(id))
    }

    /// Apply a finished drag optimistically and return the confirmation call.
    pub fn drag_end(&mut self, gesture: DragGesture) -> Option<Command> {
        let mv = reconcile(self.board.tasks(), &gesture)?;

        if self.pending_moves.contains_key(&mv.moved_id) {
            tracing::info!(target: "kanban.board", id = %mv.moved_id, "drag rejected, previous move unconfirmed");
            self.info("Still saving the previous move of this task");
            return None;
        }

        tracing::debug!(
            target: "kanban.board",
            id = %mv.moved_id,
            from = %gesture.source.status,
            to = %mv.new_status,
            "optimistic move"
        );
        let previous = gesture.source.status;
        self.board.set_all(mv.updated_tasks);
        self.pending_moves.insert(mv.moved_id.clone(), previous);

        Some(Command::UpdateStatus {
            id: mv.moved_id,
            status: mv.new_status,
        })
    }

    pub fn apply(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::Loaded(Ok(tasks)) => {
                tracing::info!(target: "kanban.board", count = tasks.len(), "tasks loaded");
                self.board.set_all(tasks);
            }
            ApiEvent::Loaded(Err(err)) => {
                tracing::error!(target: "kanban.board", error = %err, "failed to load tasks");
                self.error("Could not load tasks");
            }
            ApiEvent::Created(Ok(task)) => {
                tracing::info!(target: "kanban.board", id = %task.id, status = %task.status, "task created");
                self.info(format!("Created \"{}\"", task.title));
                self.board.append(task);
                self.dialog.close();
            }
            ApiEvent::Created(Err(err)) => {
                tracing::error!(target: "kanban.board", error = %err, "failed to create task");
                self.error("Could not create task");
            }
            ApiEvent::StatusUpdated { id, result } => {
                let previous = self.pending_moves.remove(&id);
                match result {
                    Ok(task) => {
                        tracing::debug!(target: "kanban.board", id = %id, status = %task.status, "move confirmed");
                        self.board.replace(task);
                    }
                    Err(err) => {
                        tracing::error!(target: "kanban.board", id = %id, error = %err, "move failed, reverting");
                        self.revert_move(&id, previous);
                        self.error("Could not move task; change reverted");
                    }
                }
            }
            ApiEvent::Deleted { id, result: Ok(()) } => {
                tracing::info!(target: "kanban.board", id = %id, "task deleted");
                if let Some(task) = self.board.remove(&id) {
                    self.info(format!("Deleted \"{}\"", task.title));
                }
            }
            ApiEvent::Deleted { id, result: Err(err) } => {
                tracing::error!(target: "kanban.board", id = %id, error = %err, "failed to delete task");
                self.error("Could not delete task");
            }
        }
    }

    /// Put a task whose move was rejected back in its previous column. Only
    /// that task is touched, so anything confirmed in the meantime stays.
    fn revert_move(&mut self, id: &TaskId, previous: Option<TaskStatus>) {
        let Some(status) = previous else {
            return;
        };
        let Some(current) = self.board.get(id) else {
            return;
        };
        let restored = Task {
            status,
            ..current.clone()
        };
        self.board.replace(restored);
    }

    /// Run a command to completion and apply its result.
    pub async fn run(&mut self, api: &ApiClient, command: Command) {
        let event = command.execute(api).await;
        self.apply(event);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
