pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dialog;
pub mod error;
pub mod events;
pub mod kanban_board;
pub mod logging;
pub mod reconcile;
pub mod task;
pub mod terminal;
pub mod ui;
