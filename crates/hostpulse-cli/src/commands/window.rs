use hostpulse_core::{DeltaEngine, LogSink, ProbeKind, ProbeSet, Sampler, SamplerConfig, Shutdown};
use log::warn;

use super::{Overrides, ignored_keys, install_ctrlc, resolve_config};

/// Config-file keys the window poller reads. It always samples the window
/// probe alone and never watches files.
pub const CONFIG_KEYS: &[&str] = &["interval", "probe_timeout", "cycles"];

pub fn run(overrides: Overrides) {
    let (config, file) = resolve_config(SamplerConfig::window_poller(), &overrides);
    for key in ignored_keys(&file, CONFIG_KEYS) {
        warn!("config key '{key}' is not used by the window command; ignoring it");
    }

    let shutdown = Shutdown::new();
    install_ctrlc(&shutdown);

    let probes = ProbeSet::system(&[ProbeKind::Window], config.probe_timeout);
    let mut sampler = Sampler::new(probes, DeltaEngine::new(), LogSink, &config);
    sampler.run(&shutdown);
}
