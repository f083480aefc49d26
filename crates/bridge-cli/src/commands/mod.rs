//! CLI subcommands.

pub mod compile;
pub mod console;
pub mod health;
pub mod sample;
