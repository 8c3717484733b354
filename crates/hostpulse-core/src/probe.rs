//! Abstract probe trait and the readings probes produce.
//!
//! Every probe implements the [`Probe`] trait, which provides metadata via
//! [`ProbeInfo`], availability checking, and one fallible sample per call.
//! The sampler never talks to the operating system directly; it only sees
//! probes, so tests can drive it with scripted fakes.

use serde::Serialize;

use crate::error::ProbeError;

/// The metric domain a probe covers. Also the fixed sampling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Foreground application and window title.
    Window,
    /// Global CPU utilization.
    Cpu,
    /// Physical memory usage.
    Memory,
    /// GPU presence.
    Gpu,
    /// Per-interface cumulative network counters.
    Network,
}

impl ProbeKind {
    /// All kinds in sampling order.
    pub const ALL: [ProbeKind; 5] = [
        ProbeKind::Window,
        ProbeKind::Cpu,
        ProbeKind::Memory,
        ProbeKind::Gpu,
        ProbeKind::Network,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Gpu => "gpu",
            Self::Network => "network",
        }
    }

    /// Parse a probe name as accepted on the command line and in config files.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "window" => Some(Self::Window),
            "cpu" => Some(Self::Cpu),
            "memory" | "mem" | "ram" => Some(Self::Memory),
            "gpu" => Some(Self::Gpu),
            "network" | "net" => Some(Self::Network),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target platform for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Works on any platform `sysinfo` supports.
    Any,
    /// Requires macOS.
    MacOS,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::MacOS => write!(f, "macos"),
        }
    }
}

/// Metadata about a probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeInfo {
    /// Unique identifier (e.g. `"network"`).
    pub name: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    /// Metric domain.
    pub kind: ProbeKind,
    /// Target platform.
    pub platform: Platform,
}

/// Trait that every probe must implement.
///
/// `sample` takes `&mut self` because library-backed probes keep a refreshed
/// handle between calls. A call is synchronous and must stay bounded by the
/// polling period; command-backed probes enforce this with a timeout.
pub trait Probe {
    /// What one successful sample yields.
    type Output;

    /// Probe metadata.
    fn info(&self) -> &ProbeInfo;

    /// Check if this probe can operate on the current machine.
    fn is_available(&self) -> bool;

    /// Take one reading.
    fn sample(&mut self) -> Result<Self::Output, ProbeError>;

    /// Convenience: name from info.
    fn name(&self) -> &'static str {
        self.info().name
    }
}

/// Foreground application identity. Always "current value", never a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowInfo {
    pub app_name: String,
    /// Empty when the window has no title or cannot be introspected.
    pub window_title: String,
}

/// Global CPU utilization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CpuReading {
    /// Percentage in `[0, 100]`.
    pub usage_percent: f64,
    pub logical_cores: usize,
}

/// Physical memory usage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryReading {
    pub used_bytes: u64,
    pub total_bytes: u64,
    /// Percentage in `[0, 100]`; zero when the total is unknown.
    pub used_percent: f64,
}

impl MemoryReading {
    pub fn new(used_bytes: u64, total_bytes: u64) -> Self {
        let used_percent = if total_bytes > 0 {
            (used_bytes as f64 / total_bytes as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            used_bytes,
            total_bytes,
            used_percent,
        }
    }
}

/// GPU presence classification. There is deliberately no load figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuStatus {
    /// An accelerator is registered; detailed stats need elevated privileges.
    Active,
    /// The registry query ran but found no accelerator.
    NotAvailable,
}

impl GpuStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active (detailed stats require powermetrics with sudo)",
            Self::NotAvailable => "N/A",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_accepts_aliases() {
        assert_eq!(ProbeKind::parse("net"), Some(ProbeKind::Network));
        assert_eq!(ProbeKind::parse(" RAM "), Some(ProbeKind::Memory));
        assert_eq!(ProbeKind::parse("Window"), Some(ProbeKind::Window));
        assert_eq!(ProbeKind::parse("disk"), None);
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in ProbeKind::ALL {
            assert_eq!(ProbeKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn all_is_in_sampling_order() {
        let mut sorted = ProbeKind::ALL;
        sorted.sort();
        assert_eq!(sorted, ProbeKind::ALL);
    }

    #[test]
    fn memory_percent_computed() {
        let m = MemoryReading::new(4 * 1024, 16 * 1024);
        assert!((m.used_percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn memory_percent_zero_total() {
        let m = MemoryReading::new(10, 0);
        assert_eq!(m.used_percent, 0.0);
    }
}
