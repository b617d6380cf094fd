//! Command-line interface for repolens
//!
//! - `args`: clap definitions
//! - `run`: entry point and dispatch
//! - `commands`: command implementations and output helpers

pub mod args;
mod commands;
mod run;


pub use args::{Cli, Commands, build_cli};
pub use commands::{render_config_table, to_json};
pub use run::{overrides_from, run};
