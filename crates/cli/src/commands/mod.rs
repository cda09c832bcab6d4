//! CLI subcommand implementations.

pub mod cart;
pub mod session;
pub mod watch;
