//! NetworkProbe — per-interface cumulative byte counters from `sysinfo`.
//!
//! Each interface becomes one [`Observation`] keyed by its name. Rates are
//! not computed here; that is the delta engine's job.

use std::time::Instant;

use sysinfo::Networks;

use crate::delta::{NetCounters, Observation};
use crate::error::ProbeError;
use crate::probe::{Platform, Probe, ProbeInfo, ProbeKind};

static NETWORK_INFO: ProbeInfo = ProbeInfo {
    name: "network",
    description: "Cumulative bytes sent/received per network interface",
    kind: ProbeKind::Network,
    platform: Platform::Any,
};

pub struct NetworkProbe {
    networks: Networks,
}

impl NetworkProbe {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl Default for NetworkProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Probe for NetworkProbe {
    type Output = Vec<Observation<NetCounters>>;

    fn info(&self) -> &ProbeInfo {
        &NETWORK_INFO
    }

    fn is_available(&self) -> bool {
        sysinfo::IS_SUPPORTED_SYSTEM
    }

    fn sample(&mut self) -> Result<Self::Output, ProbeError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(ProbeError::unavailable("sysinfo does not support this OS"));
        }
        // `true` drops interfaces that vanished and picks up new ones.
        self.networks.refresh(true);
        let now = Instant::now();

        let mut observations: Vec<Observation<NetCounters>> = self
            .networks
            .iter()
            .map(|(name, data)| {
                Observation::new(
                    name.as_str(),
                    now,
                    NetCounters::new(data.total_transmitted(), data.total_received()),
                )
            })
            .collect();
        observations.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observations_are_sorted_and_share_timestamp() {
        let mut probe = NetworkProbe::new();
        if !probe.is_available() {
            return;
        }
        let obs = probe.sample().unwrap();
        assert!(obs.windows(2).all(|w| w[0].key <= w[1].key));
        assert!(obs.windows(2).all(|w| w[0].timestamp == w[1].timestamp));
    }
}
