use crate::task::{Task, TaskId, TaskStatus};

/// In-memory task collection plus the board's cursor.
///
/// The collection is authoritative for rendering; the server owns the durable
/// copy. Column membership is derived from `Task::status` on every read.
#[derive(Debug, Default, Clone)]
pub struct KanbanBoard {
    tasks: Vec<Task>,
    pub selected_status: usize,
    pub selected_task: usize,
}

impl KanbanBoard {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            selected_status: 0,
            selected_task: 0,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn set_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.clamp_selection();
    }

    pub fn append(&mut self, task: Task) {
        self.tasks.push(task);
    }

    /// Returns false when no task carries `task.id`.
    pub fn replace(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                self.clamp_selection();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| &t.id == id)?;
        let removed = self.tasks.remove(pos);
        self.clamp_selection();
        Some(removed)
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn get_tasks_by_status(&self, status: TaskStatus) -> Vec<&Task> {
        tasks_by_status(&self.tasks, status).collect()
    }

    pub fn count_by_status(&self, status: TaskStatus) -> usize {
        tasks_by_status(&self.tasks, status).count()
    }

    pub fn current_status(&self) -> TaskStatus {
        TaskStatus::from_column(self.selected_status).unwrap_or_default()
    }

    pub fn selected(&self) -> Option<&Task> {
        tasks_by_status(&self.tasks, self.current_status()).nth(self.selected_task)
    }

    pub fn select_column(&mut self, direction: isize) {
        let last = TaskStatus::ALL.len() as isize - 1;
        self.selected_status = (self.selected_status as isize + direction).clamp(0, last) as usize;
        self.clamp_selection();
    }

    pub fn select_task(&mut self, direction: isize) {
        let len = self.count_by_status(self.current_status());
        if len == 0 {
            self.selected_task = 0;
            return;
        }
        self.selected_task =
            (self.selected_task as isize + direction).clamp(0, len as isize - 1) as usize;
    }

    pub fn focus(&mut self, status: TaskStatus, index: usize) {
        self.selected_status = status.column();
        self.selected_task = index;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.count_by_status(self.current_status());
        self.selected_task = self.selected_task.min(len.saturating_sub(1));
    }
}

/// Column view: tasks with `status`, in collection order.
pub fn tasks_by_status(tasks: &[Task], status: TaskStatus) -> impl Iterator<Item = &Task> {
    tasks.iter().filter(move |t| t.status == status)
}
