use std::io;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::error::AppError;

pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

pub fn check_tui_support() -> Result<(), AppError> {
    if !atty::is(atty::Stream::Stdout) {
        return Err(AppError::Terminal("stdout is not a terminal".to_string()));
    }
    if !cfg!(windows) && std::env::var("TERM").is_err() {
        return Err(AppError::Terminal(
            "TERM environment variable not set".to_string(),
        ));
    }
    Ok(())
}

pub fn setup_terminal() -> Result<Tui, AppError> {
    enable_raw_mode()?;
    enter_screen().map_err(|err| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        let _ = disable_raw_mode();
        err
    })
}

fn enter_screen() -> Result<Tui, AppError> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

pub fn restore_terminal(terminal: &mut Tui) {
    let _ = disable_raw_mode();
    let _ = execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    );
    let _ = terminal.show_cursor();
}
