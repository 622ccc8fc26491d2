//! CLI Adapter
//!
//! Command-line interface for the harvester.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, RunCmd, StatusCmd, ResetCmd, execute};

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}
