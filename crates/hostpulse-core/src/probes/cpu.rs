//! CpuProbe — global CPU utilization from `sysinfo`.

use sysinfo::{CpuRefreshKind, MINIMUM_CPU_UPDATE_INTERVAL, RefreshKind, System};

use crate::error::ProbeError;
use crate::probe::{CpuReading, Platform, Probe, ProbeInfo, ProbeKind};

static CPU_INFO: ProbeInfo = ProbeInfo {
    name: "cpu",
    description: "Global CPU utilization and logical core count",
    kind: ProbeKind::Cpu,
    platform: Platform::Any,
};

pub struct CpuProbe {
    sys: System,
    primed: bool,
}

impl CpuProbe {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage()),
        );
        Self { sys, primed: false }
    }
}

impl Default for CpuProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for CpuProbe {
    type Output = CpuReading;

    fn info(&self) -> &ProbeInfo {
        &CPU_INFO
    }

    fn is_available(&self) -> bool {
        sysinfo::IS_SUPPORTED_SYSTEM
    }

    fn sample(&mut self) -> Result<CpuReading, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::unavailable("sysinfo does not support this OS"));
        }
        // Usage is measured between two refreshes; the very first sample
        // needs a short settle window, later ones measure since the last poll.
        if !self.primed {
            self.sys.refresh_cpu_usage();
            std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
            self.primed = true;
        }
        self.sys.refresh_cpu_usage();

        let logical_cores = self.sys.cpus().len();
        if logical_cores == 0 {
            return Err(ProbeError::unavailable("no CPU information reported"));
        }
        let usage = f64::from(self.sys.global_cpu_usage());
        if !usage.is_finite() {
            return Err(ProbeError::parse_failed(format!(
                "non-finite CPU usage {usage}"
            )));
        }

        Ok(CpuReading {
            usage_percent: usage.clamp(0.0, 100.0),
            logical_cores,
        })
    }
}
