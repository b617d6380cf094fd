//! Configuration management for repolens
//!
//! A single immutable [`Config`] is built once at process start and handed to
//! every component constructor. Values resolve with precedence
//! CLI > environment > config file > built-in defaults, and each key records
//! where its value came from.

mod discovery;
mod model;
mod sources;
mod validation;

pub use discovery::CliOverrides;
pub use model::*;
pub use sources::ConfigSource;
