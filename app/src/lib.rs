pub mod cli;
pub mod commands;
pub mod output;

pub use cli::{Cli, Command};
pub use commands::{run, Context};
