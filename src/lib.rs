pub mod app;
pub mod cli;
pub mod config;
pub mod event;
pub mod format;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod system;
pub mod ui;
