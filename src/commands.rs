//! Non-interactive subcommands.

use std::fmt::Write as _;

use crate::api::ApiClient;
use crate::cli::Commands;
use crate::dialog::validate_new_task;
use crate::error::AppError;
use crate::kanban_board::KanbanBoard;
use crate::task::{TaskId, TaskStatus};

pub async fn run(api: &ApiClient, command: Commands) -> Result<(), AppError> {
    match command {
        Commands::Board => Ok(()),
        Commands::List => {
            let mut board = KanbanBoard::new();
            board.set_all(api.list_tasks().await?);
            print!("{}", format_board(&board));
            Ok(())
        }
        Commands::Add {
            title,
            description,
            status,
        } => {
            let new_task = validate_new_task(&title, &description, status)?;
            let task = api.create_task(&new_task).await?;
            tracing::info!(target: "kanban.cli", id = %task.id, "task created");
            println!("created [{}] {} ({})", task.id, task.title, task.status);
            Ok(())
        }
        Commands::Move { id, status } => {
            let task = api.update_status(&TaskId::new(id), status).await?;
            tracing::info!(target: "kanban.cli", id = %task.id, status = %task.status, "task moved");
            println!("moved [{}] {} -> {}", task.id, task.title, task.status);
            Ok(())
        }
        Commands::Delete { id } => {
            let id = TaskId::new(id);
            api.delete_task(&id).await?;
            tracing::info!(target: "kanban.cli", id = %id, "task deleted");
            println!("deleted [{}]", id);
            Ok(())
        }
    }
}

pub fn format_board(board: &KanbanBoard) -> String {
    let mut out = String::new();
    for status in TaskStatus::ALL {
        let tasks = board.get_tasks_by_status(status);
        let _ = writeln!(out, "{} ({}):", status.label(), tasks.len());
        for task in tasks {
            let _ = writeln!(out, "- [{}] {}: {}", task.id, task.title, task.description);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::task::task;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    #[test]
    fn formats_every_column() {
        let mut board = KanbanBoard::new();
        board.set_all(vec![task("1", TaskStatus::Done), task("2", TaskStatus::ToDo)]);
        assert_eq!(
            format_board(&board),
            "To Do (1):\n- [2] title 2: description 2\nIn Progress (0):\nDone (1):\n- [1] title 1: description 1\n"
        );
    }

    #[tokio::test]
    async fn add_validates_before_sending() {
        let mut server = Server::new_async().await;
        let m = server.mock("POST", "/tasks").expect(0).create_async().await;
        let api = ApiClient::new(&server.url()).unwrap();

        let err = run(
            &api,
            Commands::Add {
                title: "T".into(),
                description: " ".into(),
                status: TaskStatus::ToDo,
            },
        )
        .await
        .unwrap_err();

        m.assert_async().await;
        assert!(matches!(
            err,
            AppError::Validation(ValidationError::MissingDescription)
        ));
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn move_failure_is_transport_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("PUT", "/tasks/x")
            .with_status(500)
            .create_async()
            .await;
        let api = ApiClient::new(&server.url()).unwrap();

        let err = run(
            &api,
            Commands::Move {
                id: "x".into(),
                status: TaskStatus::Done,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
