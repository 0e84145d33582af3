mod commands;
mod runner;
mod terminal;

pub use crate::commands::Command;
pub use crate::runner::Runner;
