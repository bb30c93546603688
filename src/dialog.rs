use crate::error::ValidationError;
use crate::task::{NewTask, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogField {
    #[default]
    Title,
    Description,
    Status,
}

impl DialogField {
    fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::Status,
            Self::Status => Self::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Title => Self::Status,
            Self::Description => Self::Title,
            Self::Status => Self::Description,
        }
    }
}

/// "New task" form state.
#[derive(Debug, Clone, Default)]
pub struct CreateDialog {
    pub open: bool,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub focus: DialogField,
}

impl CreateDialog {
    pub fn open(&mut self) {
        self.open = true;
    }

    /// Close and clear every field; status returns to `ToDo`.
    pub fn close(&mut self) {
        *self = Self::default();
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn cycle_status(&mut self, step: isize) {
        self.status = self.status.cycle(step);
    }

    pub fn push_char(&mut self, c: char) {
        match self.focus {
            DialogField::Title => self.title.push(c),
            DialogField::Description => self.description.push(c),
            DialogField::Status => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            DialogField::Title => {
                self.title.pop();
            }
            DialogField::Description => {
                self.description.pop();
            }
            DialogField::Status => {}
        }
    }

    pub fn validate(&self) -> Result<NewTask, ValidationError> {
        validate_new_task(&self.title, &self.description, self.status)
    }
}

/// Both fields must be non-empty after trimming. Submitted text is kept as typed.
pub fn validate_new_task(
    title: &str,
    description: &str,
    status: TaskStatus,
) -> Result<NewTask, ValidationError> {
    match (title.trim().is_empty(), description.trim().is_empty()) {
        (true, true) => Err(ValidationError::MissingTitleAndDescription),
        (true, false) => Err(ValidationError::MissingTitle),
        (false, true) => Err(ValidationError::MissingDescription),
        (false, false) => Ok(NewTask {
            title: title.to_string(),
            description: description.to_string(),
            status,
        }),
    }
}
