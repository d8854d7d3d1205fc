//! Driftmix App - Terminal front-end
//!
//! Wires configuration, the sound catalog, the mix store and the playback
//! engine together behind a line-oriented command interface.

pub mod commands;
pub mod config;
pub mod notifier;
pub mod session;

pub use commands::Command;
pub use config::{AppConfig, Cli};
pub use notifier::LogNotifier;
pub use session::{Flow, Session};
