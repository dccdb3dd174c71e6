// Library surface for headless/integration tests and reuse.
// The binary only adds CLI parsing and terminal lifecycle on top.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod cue;
pub mod engine;
pub mod error;
pub mod logging;
pub mod phase;
pub mod report;
pub mod runtime;
pub mod ui;
