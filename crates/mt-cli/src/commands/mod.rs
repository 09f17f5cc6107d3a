//! Subcommand implementations.
//!
//! Every command takes its output writer as a parameter so tests can
//! capture what the user would see.

pub mod delete;
pub mod edit;
pub mod events;
pub mod import;
pub mod log;
pub mod settings;
pub mod stats;
pub mod status;
pub mod sync;

mod util;
