//! Sampler loop: probes → delta engine → sink, once per interval.
//!
//! One cycle runs every configured probe exactly once, in the fixed order
//! window, cpu, memory, gpu, network. A failing probe becomes
//! [`Metric::Unavailable`] in that cycle's [`Snapshot`]; it never stops the
//! other probes or the loop. The snapshot reaches the sink only after every
//! probe of the cycle has settled.

use std::collections::HashMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, TimeZone};
use log::{debug, info, warn};
use serde::Serialize;

use crate::config::SamplerConfig;
use crate::delta::{DeltaEngine, NetCounters, Observation};
use crate::error::{ProbeError, ProbeErrorKind};
use crate::probe::{CpuReading, GpuStatus, MemoryReading, Probe, ProbeKind, WindowInfo};
use crate::probes::{CpuProbe, GpuProbe, MemoryProbe, NetworkProbe, WindowProbe};
use crate::shutdown::Shutdown;
use crate::sink::Sink;

/// Boxed probe with a fixed output type.
pub type BoxedProbe<T> = Box<dyn Probe<Output = T>>;

/// Output of the network probe: one observation per interface.
pub type NetworkObservations = Vec<Observation<NetCounters>>;

/// One metric of a snapshot: a value, or the reason it is missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric<T> {
    Ready(T),
    Unavailable { kind: ProbeErrorKind, reason: String },
}

impl<T> Metric<T> {
    pub fn from_result(result: Result<T, ProbeError>) -> Self {
        match result {
            Ok(v) => Self::Ready(v),
            Err(e) => Self::Unavailable {
                kind: e.kind,
                reason: e.detail,
            },
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Aggregate network throughput for one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkThroughput {
    /// No interface has history yet.
    Warming,
    Measured(NetworkRates),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkRates {
    /// Bytes per second summed over active interfaces.
    pub upload_per_second: f64,
    pub download_per_second: f64,
    /// Interfaces that moved at least one byte this interval.
    pub active_interfaces: Vec<String>,
    pub interval_seconds: f64,
}

/// Everything gathered in one cycle. `None` means the probe is not
/// configured for this run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub collected_unix_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<Metric<WindowInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Metric<CpuReading>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Metric<MemoryReading>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu: Option<Metric<GpuStatus>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Metric<NetworkThroughput>>,
}

impl Snapshot {
    /// Empty snapshot for `cycle`, stamped now.
    pub fn empty(cycle: u64) -> Self {
        Self {
            cycle,
            collected_unix_ms: unix_ms_now(),
            window: None,
            cpu: None,
            memory: None,
            gpu: None,
            network: None,
        }
    }

    /// Collection time in the local timezone.
    pub fn collected_at(&self) -> DateTime<Local> {
        i64::try_from(self.collected_unix_ms)
            .ok()
            .and_then(|ms| Local.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Local::now)
    }

    /// Number of configured metrics that are unavailable this cycle.
    pub fn unavailable_count(&self) -> usize {
        [
            self.window.as_ref().map(Metric::is_ready),
            self.cpu.as_ref().map(Metric::is_ready),
            self.memory.as_ref().map(Metric::is_ready),
            self.gpu.as_ref().map(Metric::is_ready),
            self.network.as_ref().map(Metric::is_ready),
        ]
        .into_iter()
        .filter(|ready| *ready == Some(false))
        .count()
    }
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The probes one sampler drives. Unset slots are skipped.
#[derive(Default)]
pub struct ProbeSet {
    pub window: Option<BoxedProbe<WindowInfo>>,
    pub cpu: Option<BoxedProbe<CpuReading>>,
    pub memory: Option<BoxedProbe<MemoryReading>>,
    pub gpu: Option<BoxedProbe<GpuStatus>>,
    pub network: Option<BoxedProbe<NetworkObservations>>,
}

impl ProbeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Real probes for `kinds`; command-backed probes use `command_timeout`.
    pub fn system(kinds: &[ProbeKind], command_timeout: Duration) -> Self {
        let mut set = Self::new();
        for kind in kinds {
            match kind {
                ProbeKind::Window => set.window = Some(Box::new(WindowProbe::new(command_timeout))),
                ProbeKind::Cpu => set.cpu = Some(Box::new(CpuProbe::new())),
                ProbeKind::Memory => set.memory = Some(Box::new(MemoryProbe::new())),
                ProbeKind::Gpu => set.gpu = Some(Box::new(GpuProbe::new(command_timeout))),
                ProbeKind::Network => set.network = Some(Box::new(NetworkProbe::new())),
            }
        }
        set
    }

    pub fn with_window(mut self, probe: impl Probe<Output = WindowInfo> + 'static) -> Self {
        self.window = Some(Box::new(probe));
        self
    }

    pub fn with_cpu(mut self, probe: impl Probe<Output = CpuReading> + 'static) -> Self {
        self.cpu = Some(Box::new(probe));
        self
    }

    pub fn with_memory(mut self, probe: impl Probe<Output = MemoryReading> + 'static) -> Self {
        self.memory = Some(Box::new(probe));
        self
    }

    pub fn with_gpu(mut self, probe: impl Probe<Output = GpuStatus> + 'static) -> Self {
        self.gpu = Some(Box::new(probe));
        self
    }

    pub fn with_network(
        mut self,
        probe: impl Probe<Output = NetworkObservations> + 'static,
    ) -> Self {
        self.network = Some(Box::new(probe));
        self
    }

    /// Configured kinds in sampling order.
    pub fn kinds(&self) -> Vec<ProbeKind> {
        let mut kinds = Vec::new();
        if self.window.is_some() {
            kinds.push(ProbeKind::Window);
        }
        if self.cpu.is_some() {
            kinds.push(ProbeKind::Cpu);
        }
        if self.memory.is_some() {
            kinds.push(ProbeKind::Memory);
        }
        if self.gpu.is_some() {
            kinds.push(ProbeKind::Gpu);
        }
        if self.network.is_some() {
            kinds.push(ProbeKind::Network);
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.kinds().is_empty()
    }
}

/// Feed one cycle of interface observations through the engine and sum
/// the rates of interfaces that moved any bytes.
///
/// Interfaces seen for the first time only set a baseline and contribute
/// nothing. Interfaces missing from `observations` are dropped from the
/// engine. The result is [`NetworkThroughput::Warming`] only when no observed
/// interface had history; a reset or stalled interface with history still
/// yields a zero-rate measurement.
pub fn aggregate_network(
    engine: &mut DeltaEngine<NetCounters>,
    observations: NetworkObservations,
) -> NetworkThroughput {
    let seen: Vec<String> = observations.iter().map(|o| o.key.clone()).collect();

    let mut upload_per_second = 0.0;
    let mut download_per_second = 0.0;
    let mut active_interfaces = Vec::new();
    let mut interval_seconds = None;
    let mut since_history = None;

    for observation in observations {
        if let Some(prev) = engine.get(&observation.key) {
            since_history.get_or_insert(
                observation
                    .timestamp
                    .saturating_duration_since(prev.timestamp)
                    .as_secs_f64(),
            );
        }
        let Some(rate) = engine.update(observation) else {
            continue;
        };
        interval_seconds.get_or_insert(rate.interval_seconds);
        if rate.delta.total() > 0 {
            upload_per_second += rate.sent_per_second();
            download_per_second += rate.received_per_second();
            active_interfaces.push(rate.key);
        }
    }

    engine.retain_keys(seen.iter().map(String::as_str));

    match interval_seconds.or(since_history) {
        None => NetworkThroughput::Warming,
        Some(interval_seconds) => NetworkThroughput::Measured(NetworkRates {
            upload_per_second,
            download_per_second,
            active_interfaces,
            interval_seconds,
        }),
    }
}

/// Drives a [`ProbeSet`] on a fixed period and hands snapshots to a sink.
pub struct Sampler<S> {
    probes: ProbeSet,
    network_state: DeltaEngine<NetCounters>,
    sink: S,
    interval: Duration,
    max_cycles: Option<u64>,
    cycle: u64,
    last_errors: HashMap<ProbeKind, ProbeError>,
}

impl<S: Sink> Sampler<S> {
    pub fn new(
        probes: ProbeSet,
        network_state: DeltaEngine<NetCounters>,
        sink: S,
        config: &SamplerConfig,
    ) -> Self {
        Self {
            probes,
            network_state,
            sink,
            interval: config.interval,
            max_cycles: config.max_cycles,
            cycle: 0,
            last_errors: HashMap::new(),
        }
    }

    /// Run every configured probe once and build the snapshot.
    pub fn sample(&mut self) -> Snapshot {
        self.cycle += 1;
        let mut snapshot = Snapshot::empty(self.cycle);
        let errors = &mut self.last_errors;

        snapshot.window = self.probes.window.as_mut().map(|p| take(p.as_mut(), errors));
        snapshot.cpu = self.probes.cpu.as_mut().map(|p| take(p.as_mut(), errors));
        snapshot.memory = self.probes.memory.as_mut().map(|p| take(p.as_mut(), errors));
        snapshot.gpu = self.probes.gpu.as_mut().map(|p| take(p.as_mut(), errors));
        snapshot.network = self.probes.network.as_mut().map(|p| {
            match take(p.as_mut(), errors) {
                Metric::Ready(observations) => {
                    Metric::Ready(aggregate_network(&mut self.network_state, observations))
                }
                Metric::Unavailable { kind, reason } => {
                    // A gap would make the next rate span two intervals.
                    self.network_state.clear();
                    Metric::Unavailable { kind, reason }
                }
            }
        });

        snapshot.collected_unix_ms = unix_ms_now();
        snapshot
    }

    /// One full cycle: sample, then hand the snapshot to the sink.
    pub fn run_cycle(&mut self) -> Snapshot {
        let snapshot = self.sample();
        if let Err(e) = self.sink.consume(&snapshot) {
            warn!("sink failed on cycle {}: {e}", snapshot.cycle);
        }
        debug!(
            "cycle {} done, {} metric(s) unavailable",
            snapshot.cycle,
            snapshot.unavailable_count()
        );
        snapshot
    }

    /// Cycle until `shutdown` fires or the cycle bound is reached. The first
    /// cycle starts immediately. Returns the number of completed cycles.
    pub fn run(&mut self, shutdown: &Shutdown) -> u64 {
        let probes: Vec<&str> = self.probes.kinds().into_iter().map(ProbeKind::as_str).collect();
        info!(
            "sampler started: probes [{}], interval {}ms",
            probes.join(", "),
            self.interval.as_millis()
        );

        let mut completed = 0u64;
        while !shutdown.is_triggered() {
            let started = Instant::now();
            self.run_cycle();
            completed += 1;

            if self.max_cycles.is_some_and(|max| completed >= max) {
                break;
            }
            let wait = self.interval.saturating_sub(started.elapsed());
            if !shutdown.wait_timeout(wait) {
                break;
            }
        }

        if let Err(e) = self.sink.finish() {
            warn!("sink failed to finish: {e}");
        }
        info!("sampler stopped after {completed} cycle(s)");
        completed
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn network_state(&self) -> &DeltaEngine<NetCounters> {
        &self.network_state
    }
}

/// Invoke one probe, logging failures. A repeated identical failure is
/// logged at debug level so a permanently missing facility does not flood
/// the log.
fn take<T>(
    probe: &mut dyn Probe<Output = T>,
    last_errors: &mut HashMap<ProbeKind, ProbeError>,
) -> Metric<T> {
    let kind = probe.info().kind;
    let result = probe.sample();
    match &result {
        Ok(_) => {
            if last_errors.remove(&kind).is_some() {
                info!("probe '{}' recovered", probe.name());
            }
        }
        Err(e) => {
            if last_errors.get(&kind) == Some(e) {
                debug!("probe '{}' still failing: {e}", probe.name());
            } else {
                warn!("probe '{}' failed: {e}", probe.name());
                last_errors.insert(kind, e.clone());
            }
        }
    }
    Metric::from_result(result)
}
