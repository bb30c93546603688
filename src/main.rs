use std::time::Duration;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use taskboard::api::ApiClient;
use taskboard::app::App;
use taskboard::cli::{Args, Commands};
use taskboard::config::{self, AppConfig};
use taskboard::error::AppError;
use taskboard::{commands, logging, terminal, ui};

#[tokio::main]
async fn main() {
    let mut log_guard = None;
    let exit = match real_main(&mut log_guard).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };
    // process::exit skips destructors; flush buffered log lines first.
    drop(log_guard);
    std::process::exit(exit);
}

async fn real_main(log_guard: &mut Option<WorkerGuard>) -> Result<(), AppError> {
    let args = Args::parse();
    let mut cfg =
        config::load(args.config.as_deref()).map_err(|e| AppError::Config(e.to_string()))?;
    if let Some(url) = args.api_url {
        cfg.api.base_url = url;
    }
    if let Some(level) = args.log_level {
        cfg.logging.level = level;
    }

    let command = args.command.unwrap_or(Commands::Board);
    let tui = matches!(command, Commands::Board);
    *log_guard = logging::init_tracing(&cfg.logging, tui).map_err(AppError::Config)?;
    tracing::debug!(target: "kanban.cli", base_url = %cfg.api.base_url, ?command, "starting");

    let api = ApiClient::from_config(&cfg.api)?;
    if tui {
        run_board(&cfg, &api).await
    } else {
        commands::run(&api, command).await
    }
}

async fn run_board(cfg: &AppConfig, api: &ApiClient) -> Result<(), AppError> {
    terminal::check_tui_support()?;
    let mut term = terminal::setup_terminal()?;

    let mut app = App::new(cfg.ui.notice_ttl_secs);
    let tick = Duration::from_millis(cfg.ui.tick_ms.max(10));
    let result = ui::run_app(&mut term, &mut app, api, tick).await;

    terminal::restore_terminal(&mut term);
    if let Err(err) = &result {
        tracing::error!(target: "kanban.cli", error = %err, "board exited with error");
    }
    result
}
