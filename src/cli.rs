use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::task::TaskStatus;

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Kanban board for a remote task service")]
pub struct Args {
    /// Config file (default: user config dir, then ./taskboard.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Task service root URL, overrides the config file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Log filter, e.g. `debug` or `kanban.api=trace`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the interactive board (default)
    Board,
    /// Print every task grouped by column
    List,
    /// Create a task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "ToDo", value_parser = parse_status)]
        status: TaskStatus,
    },
    /// Change a task's status
    Move {
        id: String,
        #[arg(value_parser = parse_status)]
        status: TaskStatus,
    },
    /// Delete a task
    Delete { id: String },
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    s.parse()
}
