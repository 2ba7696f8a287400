pub mod commands;
pub mod handlers;

pub use commands::{CheckArgs, CliArgs, Commands, ScanArgs};
