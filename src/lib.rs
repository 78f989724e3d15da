//! snowdash library
//!
//! The fetch pipeline (cache, retry, orchestrator, scheduler) and the terminal
//! dashboard built on it. The binary in `main.rs` wires these together.

pub mod app;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod data;
pub mod logging;
pub mod refresh;
pub mod report;
pub mod retry;
pub mod snow;
pub mod ui;

#[cfg(test)]
mod test_support;
