//! # hostsim-core
//!
//! Local emulation of the driver host platform API.
//!
//! Device driver scripts are written against a small host runtime: transport
//! configs cloned from shared templates, callback-based task combinators,
//! a strict backup payload contract, and binary helpers for the WinRM
//! transport. This crate reproduces that contract so drivers can be authored
//! and exercised outside the production agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     driver script                        │
//! └──────────────────────────────────────────────────────────┘
//!        │ per-call config     │ tasks            │ result
//!        ▼                     ▼                  ▼
//! ┌────────────────┐  ┌──────────────────┐  ┌──────────────────┐
//! │ ConfigTemplate │  │ execute_all()    │  │ create_backup()  │
//! │ clone_config() │  │ execute_seq()    │  │        │         │
//! └────────────────┘  │ try_execute_*()  │  │        ▼         │
//!                     └──────────────────┘  │ DriverSession    │
//!                                           │  report_*()      │
//! ┌────────────────┐                        └──────────────────┘
//! │ winrm          │  used only by the WinRM frame builder
//! │ write_uint64_le│
//! └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use hostsim_core::{create_backup, DriverSession, ErrorType};
//! use serde_json::json;
//!
//! let mut session = DriverSession::new("cisco-ios");
//! match create_backup(Some(&json!({"running": "hostname r1\n"}))) {
//!     Ok(backup) => session.report_backup(backup)?,
//!     Err(e) => session.report_failure(ErrorType::GenericError, e.to_string())?,
//! }
//! assert!(session.is_reported());
//! # Ok::<(), hostsim_core::EmulatorError>(())
//! ```

mod backup;
mod combinator;
mod config;
mod error;
mod session;
pub mod winrm;

pub use backup::{
    create_backup, ConfigurationBackup, ResultKind, ValidatedBackup, DEFAULT_BACKUP_LABEL,
    MAX_BACKUP_SIZE,
};
pub use combinator::{
    execute_all, execute_seq, parallel_task, sequential_task, try_execute_all, try_execute_seq,
    try_sequential_task, Callback, ParallelTask, SequentialTask, TrySequentialTask,
};
pub use config::{
    clone_config, ConfigTemplate, SshConfig, SshConfigBuilder, WinrmConfig, WinrmConfigBuilder,
    DEFAULT_SSH_PORT, DEFAULT_TIMEOUT_MS, DEFAULT_WINRM_PORT,
};
pub use error::{EmulatorError, Result};
pub use session::{DriverSession, ErrorType, SessionId, SessionOutcome};
pub use winrm::{write_uint64_le, Uint64Value};
