//! Error types for probes, the watch subscription, and configuration.
//!
//! Probe errors are per-sample and never fatal: the sampler turns them into
//! placeholders. Watch setup and configuration errors are startup-only and
//! the CLI exits on them.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Why a probe could not produce a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    /// The facility is not present on this machine (wrong OS, missing binary).
    Unavailable,
    /// The facility was invoked but failed, exited non-zero, or timed out.
    ExecutionFailed,
    /// The facility answered with output of an unexpected shape.
    ParseFailed,
}

impl std::fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "unavailable"),
            Self::ExecutionFailed => write!(f, "execution failed"),
            Self::ParseFailed => write!(f, "parse failed"),
        }
    }
}

/// A failed probe invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct ProbeError {
    pub kind: ProbeErrorKind,
    pub detail: String,
}

impl ProbeError {
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            kind: ProbeErrorKind::Unavailable,
            detail: detail.into(),
        }
    }

    pub fn execution_failed(detail: impl Into<String>) -> Self {
        Self {
            kind: ProbeErrorKind::ExecutionFailed,
            detail: detail.into(),
        }
    }

    pub fn parse_failed(detail: impl Into<String>) -> Self {
        Self {
            kind: ProbeErrorKind::ParseFailed,
            detail: detail.into(),
        }
    }
}

/// Failure to establish the filesystem subscription. Fatal at startup.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot watch {}: {source}", path.display())]
    SetupFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid duration '{0}' (expected e.g. 250ms, 5s, 1m, 1h)")]
    Duration(String),
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("unknown probe '{0}' (expected one of: window, cpu, memory, gpu, network)")]
    UnknownProbe(String),
    #[error("no probes selected")]
    NoProbes,
}
