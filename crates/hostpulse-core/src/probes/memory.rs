//! MemoryProbe — used/total physical memory from `sysinfo`.

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

use crate::error::ProbeError;
use crate::probe::{MemoryReading, Platform, Probe, ProbeInfo, ProbeKind};

static MEMORY_INFO: ProbeInfo = ProbeInfo {
    name: "memory",
    description: "Used and total physical memory",
    kind: ProbeKind::Memory,
    platform: Platform::Any,
};

pub struct MemoryProbe {
    sys: System,
}

impl MemoryProbe {
    pub fn new() -> Self {
        let sys = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        Self { sys }
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for MemoryProbe {
    type Output = MemoryReading;

    fn info(&self) -> &ProbeInfo {
        &MEMORY_INFO
    }

    fn is_available(&self) -> bool {
        sysinfo::IS_SUPPORTED_SYSTEM
    }

    fn sample(&mut self) -> Result<MemoryReading, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::unavailable("sysinfo does not support this OS"));
        }
        self.sys
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());

        let total = self.sys.total_memory();
        if total == 0 {
            return Err(ProbeError::unavailable("total memory reported as zero"));
        }
        Ok(MemoryReading::new(self.sys.used_memory(), total))
    }
}
