//! # hostpulse-core
//!
//! **A small host telemetry sampler.**
//!
//! `hostpulse-core` periodically reads a handful of host statistics (foreground
//! window, CPU, memory, GPU presence, network counters), turns cumulative
//! counters into per-second rates, and hands each cycle's snapshot to a sink.
//! A separate watch loop logs filesystem changes under a directory.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hostpulse_core::{DeltaEngine, LogSink, ProbeSet, Sampler, SamplerConfig, Shutdown};
//!
//! let config = SamplerConfig::monitor();
//! let probes = ProbeSet::system(&config.probes, config.probe_timeout);
//! let mut sampler = Sampler::new(probes, DeltaEngine::new(), LogSink, &config);
//!
//! // Runs until the shutdown signal fires.
//! sampler.run(&Shutdown::new());
//! ```
//!
//! ## Architecture
//!
//! Probes → Sampler (delta engine for counters) → Snapshot → Sink
//!
//! Every probe implements the [`Probe`] trait. A probe failure never stops a
//! cycle; it shows up as [`Metric::Unavailable`] in that cycle's
//! [`Snapshot`]. Both the sampler and the [`WatchLoop`] stop when a shared
//! [`Shutdown`] signal is triggered.

pub mod config;
pub mod delta;
pub mod error;
pub mod probe;
pub mod probes;
pub mod render;
pub mod sampler;
pub mod shutdown;
pub mod sink;
pub mod watch;

pub use config::{FileConfig, SamplerConfig, parse_duration, parse_probe_list};
pub use delta::{Cumulative, DeltaEngine, NetCounters, Observation, RateSample};
pub use error::{ConfigError, ProbeError, ProbeErrorKind, WatchError};
pub use probe::{
    CpuReading, GpuStatus, MemoryReading, Platform, Probe, ProbeInfo, ProbeKind, WindowInfo,
};
pub use probes::{
    CpuProbe, GpuProbe, MemoryProbe, NetworkProbe, WindowProbe, classify_ioreg_output,
    parse_window_output, probe_catalog,
};
pub use render::{format_bytes, format_log_line, format_rate, render_frame, usage_bar};
pub use sampler::{
    Metric, NetworkRates, NetworkThroughput, ProbeSet, Sampler, Snapshot, aggregate_network,
};
pub use shutdown::Shutdown;
pub use sink::{JsonSink, LogSink, Sink, TerminalSink};
pub use watch::{ChangeKind, WatchLoop, WatchStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
