pub mod api;
pub mod shell;
pub mod state;

pub use api::{ClientError, ShellApi, SolvyClient};
pub use shell::ClientShell;
pub use state::{InvalidTransition, ShellEvent, ShellState};
