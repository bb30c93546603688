//! Turns a finished drag gesture into a new task collection and the single
//! status change the server has to confirm.

use crate::kanban_board::tasks_by_status;
use crate::task::{Task, TaskId, TaskStatus};

/// A card position: the column and the index inside that column's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragLocation {
    pub status: TaskStatus,
    pub index: usize,
}

impl DragLocation {
    pub fn new(status: TaskStatus, index: usize) -> Self {
        Self { status, index }
    }
}

/// A completed drag. `destination` is `None` when the card was dropped
/// outside every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragGesture {
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub updated_tasks: Vec<Task>,
    pub moved_id: TaskId,
    pub new_status: TaskStatus,
}

/// `None` means the gesture changes nothing and needs no server call.
///
/// Dropping inside the source column at a different index still yields a
/// `Move`; the collection comes back unchanged because positions inside a
/// column are not persisted.
pub fn reconcile(tasks: &[Task], gesture: &DragGesture) -> Option<Move> {
    let destination = gesture.destination?;
    if destination == gesture.source {
        return None;
    }

    let moved = tasks_by_status(tasks, gesture.source.status).nth(gesture.source.index)?;
    let moved_id = moved.id.clone();

    let updated_tasks = tasks
        .iter()
        .map(|t| {
            if t.id == moved_id {
                Task {
                    status: destination.status,
                    ..t.clone()
                }
            } else {
                t.clone()
            }
        })
        .collect();

    Some(Move {
        updated_tasks,
        moved_id,
        new_status: destination.status,
    })
}
