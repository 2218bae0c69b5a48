//! # dotkit Types
//!
//! Core types, traits, and enums shared across all dotkit crates.
//!
//! This crate provides the fundamental building blocks for the dotkit kit
//! manager, including:
//!
//! - Type-safe wrappers for kit identifiers
//! - Common enums for conflict policies, artifact types, provenance, and hook lifecycles
//! - The [`KitSource`] trait implemented by every resolver backend
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```
//! use dotkit_types::{ConflictPolicy, KitId, Lifecycle};
//!
//! let kit = KitId::new("devrun").unwrap();
//! assert_eq!(kit.as_str(), "devrun");
//!
//! let policy: ConflictPolicy = "skip".parse().unwrap();
//! assert_eq!(policy, ConflictPolicy::Skip);
//!
//! let event: Lifecycle = "PreToolUse".parse().unwrap();
//! assert_eq!(event.to_string(), "PreToolUse");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod identifiers;
pub mod enums;
pub mod traits;
pub mod config;

// Re-export common types for convenience
pub use errors::{DotkitError, Result};
pub use identifiers::KitId;
pub use enums::{ArtifactType, ConfigScope, ConflictPolicy, Lifecycle, LogLevel, Provenance, SourceType};
pub use traits::{KitSource, ResolvedKit};
