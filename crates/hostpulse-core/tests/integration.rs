//! Integration tests for hostpulse-core.
//!
//! These exercise the public pipeline end to end:
//! probes → sampler → delta engine → sink, plus the watch loop and config.

use std::collections::VecDeque;
use std::path::Path;
use std::time::{Duration, Instant};

use hostpulse_core::{
    ConfigError, CpuReading, DeltaEngine, FileConfig, GpuStatus, JsonSink, Metric, NetCounters,
    Observation, Platform, Probe, ProbeError, ProbeInfo, ProbeKind, ProbeSet,
    Sampler, SamplerConfig, Shutdown, WatchLoop, format_bytes, parse_window_output,
};

static NET_INFO: ProbeInfo = ProbeInfo {
    name: "network",
    description: "scripted interface counters",
    kind: ProbeKind::Network,
    platform: Platform::Any,
};

static GPU_INFO: ProbeInfo = ProbeInfo {
    name: "gpu",
    description: "always fails",
    kind: ProbeKind::Gpu,
    platform: Platform::Any,
};

static CPU_INFO: ProbeInfo = ProbeInfo {
    name: "cpu",
    description: "fixed reading",
    kind: ProbeKind::Cpu,
    platform: Platform::Any,
};

/// Replays per-cycle counter tables 5 s apart.
struct ReplayNetwork {
    base: Instant,
    cycle: u64,
    frames: VecDeque<Vec<(&'static str, u64, u64)>>,
}

impl Probe for ReplayNetwork {
    type Output = Vec<Observation<NetCounters>>;

    fn info(&self) -> &ProbeInfo {
        &NET_INFO
    }

    fn is_available(&self) -> bool {
        true
    }

    fn sample(&mut self) -> Result<Self::Output, ProbeError> {
        let frame = self
            .frames
            .pop_front()
            .ok_or_else(|| ProbeError::unavailable("no more frames"))?;
        let at = self.base + Duration::from_secs(5 * self.cycle);
        self.cycle += 1;
        Ok(frame
            .into_iter()
            .map(|(name, sent, recv)| Observation::new(name, at, NetCounters::new(sent, recv)))
            .collect())
    }
}

struct BrokenGpu;

impl Probe for BrokenGpu {
    type Output = GpuStatus;

    fn info(&self) -> &ProbeInfo {
        &GPU_INFO
    }

    fn is_available(&self) -> bool {
        false
    }

    fn sample(&mut self) -> Result<GpuStatus, ProbeError> {
        Err(ProbeError::execution_failed("ioreg exited with status 1"))
    }
}

struct FixedCpu;

impl Probe for FixedCpu {
    type Output = CpuReading;

    fn info(&self) -> &ProbeInfo {
        &CPU_INFO
    }

    fn is_available(&self) -> bool {
        true
    }

    fn sample(&mut self) -> Result<CpuReading, ProbeError> {
        Ok(CpuReading {
            usage_percent: 42.0,
            logical_cores: 10,
        })
    }
}

#[test]
fn delta_engine_reference_rate() {
    let mut engine = DeltaEngine::<u64>::new();
    let t0 = Instant::now();
    assert!(engine.update(Observation::new("bytes", t0, 1000)).is_none());
    let rate = engine
        .update(Observation::new("bytes", t0 + Duration::from_secs(5), 6000))
        .expect("second observation yields a rate");
    assert!((rate.value_per_second() - 1000.0).abs() < 1e-9);
}

#[test]
fn sampler_pipeline_to_json() {
    let network = ReplayNetwork {
        base: Instant::now(),
        cycle: 0,
        frames: VecDeque::from([
            vec![("en0", 0, 0), ("lo0", 10, 10)],
            vec![("en0", 5 * 1024, 10 * 1024), ("lo0", 10, 10)],
            vec![("en0", 5 * 1024, 10 * 1024), ("lo0", 10, 10), ("en5", 1, 1)],
        ]),
    };
    let probes = ProbeSet::new()
        .with_cpu(FixedCpu)
        .with_gpu(BrokenGpu)
        .with_network(network);
    let config = SamplerConfig {
        interval: Duration::from_millis(1),
        max_cycles: Some(3),
        ..SamplerConfig::monitor()
    };

    let mut sampler = Sampler::new(probes, DeltaEngine::new(), JsonSink::new(Vec::new()), &config);
    assert_eq!(sampler.run(&Shutdown::new()), 3);

    let out = String::from_utf8(sampler.into_sink().into_inner()).unwrap();
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);

    // GPU failure never hides the other metrics.
    for line in &lines {
        assert_eq!(line["gpu"]["unavailable"]["kind"], "execution_failed");
        assert_eq!(line["cpu"]["ready"]["usage_percent"], 42.0);
    }

    assert_eq!(lines[0]["network"]["ready"], "warming");

    let second = &lines[1]["network"]["ready"]["measured"];
    assert_eq!(second["upload_per_second"], 1024.0);
    assert_eq!(second["download_per_second"], 2048.0);
    assert_eq!(second["active_interfaces"], serde_json::json!(["en0"]));

    let third = &lines[2]["network"]["ready"]["measured"];
    assert_eq!(third["upload_per_second"], 0.0);
    assert_eq!(third["active_interfaces"], serde_json::json!([]));
}

#[test]
fn sampler_stops_on_shutdown() {
    let config = SamplerConfig {
        interval: Duration::from_secs(3600),
        ..SamplerConfig::monitor()
    };
    let mut sampler = Sampler::new(
        ProbeSet::new().with_cpu(FixedCpu),
        DeltaEngine::new(),
        JsonSink::new(Vec::new()),
        &config,
    );
    let shutdown = Shutdown::new();
    let remote = shutdown.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        remote.trigger();
    });
    let started = Instant::now();
    assert_eq!(sampler.run(&shutdown), 1);
    assert!(started.elapsed() < Duration::from_secs(60));
    stopper.join().unwrap();
}

#[test]
fn snapshot_unavailable_metric_is_typed() {
    let mut sampler = Sampler::new(
        ProbeSet::new().with_gpu(BrokenGpu),
        DeltaEngine::new(),
        JsonSink::new(Vec::new()),
        &SamplerConfig::monitor(),
    );
    let snapshot = sampler.run_cycle();
    assert!(matches!(snapshot.gpu, Some(Metric::Unavailable { .. })));
    assert!(snapshot.network.is_none());
}

#[test]
fn watch_loop_runs_on_background_thread() {
    let dir = tempfile::tempdir().unwrap();
    let watch = WatchLoop::subscribe(dir.path(), true).unwrap();
    let shutdown = Shutdown::new();
    let handle = {
        let shutdown = shutdown.clone();
        std::thread::spawn(move || watch.run(&shutdown))
    };

    std::fs::write(dir.path().join("a.log"), b"first").unwrap();
    std::thread::sleep(Duration::from_millis(500));
    shutdown.trigger();

    let stats = handle.join().unwrap();
    assert!(stats.events >= 1, "expected at least one event, got {stats:?}");
}

#[test]
fn watch_missing_directory_is_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(WatchLoop::subscribe(dir.path().join("gone"), false).is_err());
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hostpulse.toml");
    std::fs::write(&path, "interval = \"250ms\"\nprobes = [\"net\", \"cpu\"]\n").unwrap();

    let mut config = SamplerConfig::monitor();
    config.apply_file(&FileConfig::load(&path).unwrap()).unwrap();
    assert_eq!(config.interval, Duration::from_millis(250));
    assert_eq!(config.probes, vec![ProbeKind::Cpu, ProbeKind::Network]);
    assert!(config.validate().is_ok());

    std::fs::write(&path, "interval = \"0s\"\n").unwrap();
    let mut config = SamplerConfig::monitor();
    config.apply_file(&FileConfig::load(&path).unwrap()).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroDuration { .. })
    ));

    assert!(FileConfig::parse("probes = 3", Path::new("x.toml")).is_err());
}

#[test]
fn formatting_and_parsing_reference_values() {
    assert_eq!(format_bytes(999), "999 B");
    assert_eq!(format_bytes(1024), "1.00 KB");
    assert_eq!(format_bytes(1536), "1.50 KB");
    assert_eq!(format_bytes(1_048_576), "1.00 MB");

    let w = parse_window_output("Safari,My Page").unwrap();
    assert_eq!((w.app_name.as_str(), w.window_title.as_str()), ("Safari", "My Page"));
    let w = parse_window_output("Finder").unwrap();
    assert_eq!((w.app_name.as_str(), w.window_title.as_str()), ("Finder", ""));
    assert!(parse_window_output("").is_err());
}
