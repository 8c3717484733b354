//! Delta engine: turns consecutive cumulative observations into rates.
//!
//! The engine keeps exactly one observation per key. The first observation
//! for a key only establishes a baseline and yields no rate. Later
//! observations yield `Δvalue / Δtime`, except when time did not advance
//! (duplicate poll, clock anomaly) or the counter went backwards (interface
//! reset), in which case no rate is reported.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use log::debug;
use serde::Serialize;

/// A monotonically non-decreasing counter value.
pub trait Cumulative: Clone {
    /// Difference `self - earlier`, or `None` when any component decreased.
    fn delta_since(&self, earlier: &Self) -> Option<Self>;
}

impl Cumulative for u64 {
    fn delta_since(&self, earlier: &Self) -> Option<Self> {
        self.checked_sub(*earlier)
    }
}

/// Cumulative bytes sent and received on one network interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NetCounters {
    pub sent: u64,
    pub received: u64,
}

impl NetCounters {
    pub fn new(sent: u64, received: u64) -> Self {
        Self { sent, received }
    }

    /// Combined sent + received.
    pub fn total(&self) -> u64 {
        self.sent.saturating_add(self.received)
    }
}

impl Cumulative for NetCounters {
    fn delta_since(&self, earlier: &Self) -> Option<Self> {
        Some(Self {
            sent: self.sent.checked_sub(earlier.sent)?,
            received: self.received.checked_sub(earlier.received)?,
        })
    }
}

/// One timestamped cumulative measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<C> {
    pub key: String,
    pub timestamp: Instant,
    pub value: C,
}

impl<C> Observation<C> {
    pub fn new(key: impl Into<String>, timestamp: Instant, value: C) -> Self {
        Self {
            key: key.into(),
            timestamp,
            value,
        }
    }
}

/// Change of one counter over one interval.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSample<C> {
    pub key: String,
    pub delta: C,
    /// Always strictly positive.
    pub interval_seconds: f64,
}

impl RateSample<u64> {
    pub fn value_per_second(&self) -> f64 {
        self.delta as f64 / self.interval_seconds
    }
}

impl RateSample<NetCounters> {
    pub fn sent_per_second(&self) -> f64 {
        self.delta.sent as f64 / self.interval_seconds
    }

    pub fn received_per_second(&self) -> f64 {
        self.delta.received as f64 / self.interval_seconds
    }
}

/// Per-key single-slot memory of the last observation.
#[derive(Debug, Clone)]
pub struct DeltaEngine<C> {
    state: HashMap<String, Observation<C>>,
}

impl<C> Default for DeltaEngine<C> {
    fn default() -> Self {
        Self {
            state: HashMap::new(),
        }
    }
}

impl<C: Cumulative> DeltaEngine<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one observation; returns a rate once the key has history.
    pub fn update(&mut self, observation: Observation<C>) -> Option<RateSample<C>> {
        let Some(prev) = self.state.get(&observation.key) else {
            debug!("baseline established for '{}'", observation.key);
            self.state.insert(observation.key.clone(), observation);
            return None;
        };

        let elapsed = match observation.timestamp.checked_duration_since(prev.timestamp) {
            Some(d) if !d.is_zero() => d,
            _ => {
                debug!(
                    "ignoring observation for '{}': timestamp did not advance",
                    observation.key
                );
                return None;
            }
        };

        let Some(delta) = observation.value.delta_since(&prev.value) else {
            debug!(
                "counter reset detected for '{}', re-baselining",
                observation.key
            );
            self.state.insert(observation.key.clone(), observation);
            return None;
        };

        let key = observation.key.clone();
        self.state.insert(key.clone(), observation);
        Some(RateSample {
            key,
            delta,
            interval_seconds: elapsed.as_secs_f64(),
        })
    }

    /// Drop every key not in `keys`.
    pub fn retain_keys<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) {
        let keep: HashSet<&str> = keys.into_iter().collect();
        self.state.retain(|k, _| keep.contains(k.as_str()));
    }

    pub fn get(&self, key: &str) -> Option<&Observation<C>> {
        self.state.get(key)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }
}
