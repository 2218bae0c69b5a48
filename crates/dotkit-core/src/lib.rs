//! # dotkit Core
//!
//! Core utilities, settings management, logging, and common functionality
//! for the dotkit kit manager.
//!
//! This crate provides:
//!
//! - **Settings**: Multi-layer configuration (defaults, settings file, environment)
//! - **Logging**: `tracing` subscriber setup that keeps stdout free for hook output
//! - **Process Execution**: Script execution with piped input and optional timeout
//! - **File Operations**: YAML handling, atomic writes, directory copies
//! - **Time Utilities**: Relative timestamps, duration measurement
//!
//! ## Example
//!
//! ```no_run
//! use dotkit_core::config::Settings;
//!
//! let settings = Settings::load().unwrap();
//! dotkit_core::log::init(&settings.log, None).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod log;
pub mod util;
pub mod time;

// Re-export commonly used items
pub use config::{Config, Settings};
pub use dotkit_types::{DotkitError, Result};

/// dotkit application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// dotkit application name
pub const APP_NAME: &str = "dotkit";
