mod config_cmd;
mod status;
mod sync;

pub use config_cmd::ConfigCommand;
pub use status::StatusCommand;
pub use sync::{SyncCommand, SyncCommandError};
