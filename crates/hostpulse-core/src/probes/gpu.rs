//! GpuProbe — checks the IORegistry for an `IOAccelerator` entry.
//!
//! Only presence is reported. Load figures need `powermetrics` with root,
//! which this probe never attempts.

use std::time::Duration;

use crate::error::ProbeError;
use crate::probe::{GpuStatus, Platform, Probe, ProbeInfo, ProbeKind};

use super::run_command;

/// Path to the ioreg binary on macOS.
const IOREG_PATH: &str = "/usr/sbin/ioreg";

const ACCELERATOR_CLASS: &str = "IOAccelerator";

static GPU_INFO: ProbeInfo = ProbeInfo {
    name: "gpu",
    description: "GPU presence from the IORegistry IOAccelerator class",
    kind: ProbeKind::Gpu,
    platform: Platform::MacOS,
};

pub struct GpuProbe {
    timeout: Duration,
}

impl GpuProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Classify `ioreg -c IOAccelerator` output.
pub fn classify_ioreg_output(raw: &str) -> GpuStatus {
    if raw.contains(ACCELERATOR_CLASS) {
        GpuStatus::Active
    } else {
        GpuStatus::NotAvailable
    }
}

impl Probe for GpuProbe {
    type Output = GpuStatus;

    fn info(&self) -> &ProbeInfo {
        &GPU_INFO
    }

    fn is_available(&self) -> bool {
        cfg!(target_os = "macos") && std::path::Path::new(IOREG_PATH).exists()
    }

    fn sample(&mut self) -> Result<GpuStatus, ProbeError> {
        if !cfg!(target_os = "macos") {
            return Err(ProbeError::unavailable("IORegistry requires macOS"));
        }
        let out = run_command(
            IOREG_PATH,
            &["-r", "-d", "1", "-w", "0", "-c", ACCELERATOR_CLASS],
            self.timeout,
        )?;
        Ok(classify_ioreg_output(&out))
    }
}
