//! Common enumerations used throughout dotkit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::errors::{DotkitError, Result};

/// Log level enumeration for the logging system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging
    None,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Detailed trace messages
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::None => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl FromStr for LogLevel {
    type Err = DotkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "NONE" | "OFF" => Ok(LogLevel::None),
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            _ => Err(DotkitError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::None => write!(f, "NONE"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Trace => write!(f, "TRACE"),
        }
    }
}

/// Rule governing what happens when an artifact destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Abort on the first existing destination
    #[default]
    Error,
    /// Leave existing files untouched
    Skip,
    /// Replace existing files unconditionally
    Overwrite,
    /// Reserved; rejected at install time
    Merge,
}

impl FromStr for ConflictPolicy {
    type Err = DotkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(ConflictPolicy::Error),
            "skip" => Ok(ConflictPolicy::Skip),
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            "merge" => Ok(ConflictPolicy::Merge),
            _ => Err(DotkitError::Validation(format!("Invalid conflict policy: {}", s))),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::Error => write!(f, "error"),
            ConflictPolicy::Skip => write!(f, "skip"),
            ConflictPolicy::Overwrite => write!(f, "overwrite"),
            ConflictPolicy::Merge => write!(f, "merge"),
        }
    }
}

/// Kind of artifact a kit can contribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    /// Agent definition (`agents/`)
    Agent,
    /// Slash command (`commands/`)
    Command,
    /// Skill bundle (`skills/<name>/SKILL.md`)
    Skill,
    /// Reference document (`docs/`)
    Doc,
    /// Hook directory, installed whole under `hooks/<kit_id>/`
    Hook,
}

impl ArtifactType {
    /// All artifact types in install order.
    pub const ALL: [ArtifactType; 5] = [
        ArtifactType::Agent,
        ArtifactType::Command,
        ArtifactType::Skill,
        ArtifactType::Doc,
        ArtifactType::Hook,
    ];

    /// Name of the type directory under the managed root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactType::Agent => "agents",
            ArtifactType::Command => "commands",
            ArtifactType::Skill => "skills",
            ArtifactType::Doc => "docs",
            ArtifactType::Hook => "hooks",
        }
    }

    /// Whether the type is copied at directory granularity.
    pub fn is_directory_granular(&self) -> bool {
        matches!(self, ArtifactType::Hook)
    }
}

impl FromStr for ArtifactType {
    type Err = DotkitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "agent" | "agents" => Ok(ArtifactType::Agent),
            "command" | "commands" => Ok(ArtifactType::Command),
            "skill" | "skills" => Ok(ArtifactType::Skill),
            "doc" | "docs" => Ok(ArtifactType::Doc),
            "hook" | "hooks" => Ok(ArtifactType::Hook),
            _ => Err(DotkitError::Validation(format!("Invalid artifact type: {}", s))),
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactType::Agent => write!(f, "agent"),
            ArtifactType::Command => write!(f, "command"),
            ArtifactType::Skill => write!(f, "skill"),
            ArtifactType::Doc => write!(f, "doc"),
            ArtifactType::Hook => write!(f, "hook"),
        }
    }
}

/// Provenance of an on-disk artifact relative to tracked configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Not tracked and carries no kit metadata
    Local,
    /// Listed under an installed kit in the configuration
    Managed,
    /// Carries kit metadata but is not tracked by the configuration
    Unmanaged,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Local => write!(f, "local"),
            Provenance::Managed => write!(f, "managed"),
            Provenance::Unmanaged => write!(f, "unmanaged"),
        }
    }
}

/// Lifecycle events the hook router can be invoked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Session started or resumed
    SessionStart,
    /// Session ended
    SessionEnd,
    /// User submitted a prompt
    UserPromptSubmit,
    /// Before a tool call
    PreToolUse,
    /// After a tool call
    PostToolUse,
    /// Notification emitted
    Notification,
    /// Main agent stopped
    Stop,
    /// Subagent stopped
    SubagentStop,
    /// Before context compaction
    PreCompact,
}

impl Lifecycle {
    /// Every lifecycle event.
    pub const ALL: [Lifecycle; 9] = [
        Lifecycle::SessionStart,
        Lifecycle::SessionEnd,
        Lifecycle::UserPromptSubmit,
        Lifecycle::PreToolUse,
        Lifecycle::PostToolUse,
        Lifecycle::Notification,
        Lifecycle::Stop,
        Lifecycle::SubagentStop,
        Lifecycle::PreCompact,
    ];

    /// Event name as written in hook manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::SessionStart => "SessionStart",
            Lifecycle::SessionEnd => "SessionEnd",
            Lifecycle::UserPromptSubmit => "UserPromptSubmit",
            Lifecycle::PreToolUse => "PreToolUse",
            Lifecycle::PostToolUse => "PostToolUse",
            Lifecycle::Notification => "Notification",
            Lifecycle::Stop => "Stop",
            Lifecycle::SubagentStop => "SubagentStop",
            Lifecycle::PreCompact => "PreCompact",
        }
    }
}

impl FromStr for Lifecycle {
    type Err = DotkitError;

    fn from_str(s: &str) -> Result<Self> {
        Lifecycle::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Lifecycle::ALL.iter().map(|e| e.as_str()).collect();
                DotkitError::Validation(format!(
                    "Invalid lifecycle '{}': expected one of {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend a kit was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Data bundled with the dotkit distribution
    Bundled,
    /// An installed package distribution
    Package,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Bundled => write!(f, "bundled"),
            SourceType::Package => write!(f, "package"),
        }
    }
}

/// Configuration scope. Project and user scopes never merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigScope {
    /// Per-project state under the project directory
    Project,
    /// Per-user state under the home directory
    User,
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigScope::Project => write!(f, "project"),
            ConfigScope::User => write!(f, "user"),
        }
    }
}
