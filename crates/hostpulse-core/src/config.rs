//! Run configuration: built-in defaults, an optional TOML file, then
//! command-line overrides applied by the binary.
//!
//! ```toml
//! interval = "2s"
//! probe_timeout = "500ms"
//! probes = ["cpu", "memory", "network"]
//! cycles = 10
//! watch = "/var/log"
//! recursive = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::probe::ProbeKind;
use crate::probes::DEFAULT_COMMAND_TIMEOUT;

/// Resource monitor refresh period.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);
/// Window poller refresh period.
pub const DEFAULT_WINDOW_INTERVAL: Duration = Duration::from_secs(1);

/// Contents of a TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub interval: Option<String>,
    pub probe_timeout: Option<String>,
    pub probes: Option<Vec<String>>,
    pub cycles: Option<u64>,
    pub watch: Option<PathBuf>,
    pub recursive: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Names of the keys the file sets.
    pub fn present_keys(&self) -> Vec<&'static str> {
        [
            ("interval", self.interval.is_some()),
            ("probe_timeout", self.probe_timeout.is_some()),
            ("probes", self.probes.is_some()),
            ("cycles", self.cycles.is_some()),
            ("watch", self.watch.is_some()),
            ("recursive", self.recursive.is_some()),
        ]
        .into_iter()
        .filter_map(|(key, set)| set.then_some(key))
        .collect()
    }

    /// Parse TOML text; `origin` is only used in error messages.
    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }
}

/// Settings the sampler loop runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    pub interval: Duration,
    /// Upper bound for one external command.
    pub probe_timeout: Duration,
    /// Stop after this many cycles; `None` runs until shutdown.
    pub max_cycles: Option<u64>,
    /// Enabled probes in sampling order.
    pub probes: Vec<ProbeKind>,
}

impl SamplerConfig {
    /// Full resource monitor: every probe, 5 s period.
    pub fn monitor() -> Self {
        Self {
            interval: DEFAULT_MONITOR_INTERVAL,
            probe_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_cycles: None,
            probes: ProbeKind::ALL.to_vec(),
        }
    }

    /// Foreground-window poller: window probe only, 1 s period.
    pub fn window_poller() -> Self {
        Self {
            interval: DEFAULT_WINDOW_INTERVAL,
            probe_timeout: DEFAULT_COMMAND_TIMEOUT,
            max_cycles: None,
            probes: vec![ProbeKind::Window],
        }
    }

    /// Overlay values present in `file`.
    pub fn apply_file(&mut self, file: &FileConfig) -> Result<(), ConfigError> {
        if let Some(interval) = &file.interval {
            self.interval = parse_duration(interval)?;
        }
        if let Some(timeout) = &file.probe_timeout {
            self.probe_timeout = parse_duration(timeout)?;
        }
        if let Some(probes) = &file.probes {
            self.probes = parse_probe_names(probes.iter().map(String::as_str))?;
        }
        if let Some(cycles) = file.cycles {
            self.max_cycles = Some(cycles);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "interval" });
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "probe_timeout",
            });
        }
        if self.probes.is_empty() {
            return Err(ConfigError::NoProbes);
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::monitor()
    }
}

/// Parse `250ms`, `5s`, `1m`, `1h`, or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let s = s.trim();

    let (numeric, multiplier) = if let Some(rest) = s.strip_suffix("ms") {
        (rest, 1u64)
    } else if let Some(rest) = s.strip_suffix('s') {
        (rest, 1000)
    } else if let Some(rest) = s.strip_suffix('m') {
        (rest, 60_000)
    } else if let Some(rest) = s.strip_suffix('h') {
        (rest, 3_600_000)
    } else {
        (s, 1000)
    };

    numeric
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|value| value.checked_mul(multiplier))
        .map(Duration::from_millis)
        .ok_or_else(|| ConfigError::Duration(s.to_string()))
}

/// Parse a comma-separated probe list such as `cpu,net`.
pub fn parse_probe_list(s: &str) -> Result<Vec<ProbeKind>, ConfigError> {
    parse_probe_names(s.split(',').filter(|name| !name.trim().is_empty()))
}

/// Resolve names to kinds, deduplicated and in sampling order.
fn parse_probe_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Vec<ProbeKind>, ConfigError> {
    let mut kinds = names
        .into_iter()
        .map(|name| ProbeKind::parse(name).ok_or_else(|| ConfigError::UnknownProbe(name.trim().to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    kinds.sort();
    kinds.dedup();
    Ok(kinds)
}
