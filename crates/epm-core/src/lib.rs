//! EPM Core - endpoint profile storage and switching
//!
//! This crate keeps a list of named LLM endpoint profiles and applies them
//! to the shared active configuration without leaking one provider's
//! credentials into another.
//!
//! # Modules
//!
//! - [`persistence`] - key-value collaborator trait, file and memory stores
//! - [`profile`] - the persisted, ordered profile list
//! - [`state`] - transactionally updated shared records
//! - [`manager`] - snapshot, apply, save, duplicate, delete, clear
//! - [`edit`] - the `Idle` / `Editing` state of the name field
//! - [`notify`] - user feedback messages
//! - [`config`] - `config.toml` and data directory resolution

#![warn(missing_docs)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

pub mod config;
pub mod edit;
pub mod manager;
pub mod notify;
pub mod persistence;
pub mod profile;
pub mod state;

pub use config::*;
pub use edit::*;
pub use manager::*;
pub use notify::*;
pub use persistence::*;
pub use profile::*;
pub use state::*;
