//! CLI subcommands.

pub mod aggregate;
pub mod validate;
