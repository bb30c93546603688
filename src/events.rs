use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
}

/// Reads terminal input on a dedicated thread and forwards it to the event
/// loop, so a blocking read never stalls network completions.
pub struct InputReader {
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl InputReader {
    pub fn start() -> (Self, mpsc::UnboundedReceiver<InputEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let handle = std::thread::spawn(move || {
            while thread_running.load(Ordering::SeqCst) {
                if !event::poll(POLL_INTERVAL).unwrap_or(false) {
                    continue;
                }
                let forwarded = match event::read() {
                    // Release/Repeat would double every keystroke on Windows.
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                        tracing::trace!(target: "kanban.input", "key pressed: {:?}", key);
                        Some(InputEvent::Key(key))
                    }
                    Ok(Event::Mouse(mouse)) => {
                        tracing::trace!(target: "kanban.input", "mouse event: {:?}", mouse);
                        Some(InputEvent::Mouse(mouse))
                    }
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!(target: "kanban.input", error = %err, "input read failed");
                        None
                    }
                };
                if let Some(ev) = forwarded {
                    if tx.send(ev).is_err() {
                        break;
                    }
                }
            }
        });
        (
            Self {
                running,
                handle: Some(handle),
            },
            rx,
        )
    }

    pub fn stop(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
