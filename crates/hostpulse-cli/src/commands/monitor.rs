use std::path::Path;
use std::thread;

use hostpulse_core::{
    DeltaEngine, JsonSink, LogSink, ProbeSet, Sampler, SamplerConfig, Shutdown, Sink,
    TerminalSink, WatchLoop, probe_catalog,
};
use log::warn;

use super::{Overrides, fail, install_ctrlc, resolve_config};

pub struct MonitorCommandConfig<'a> {
    pub overrides: Overrides<'a>,
    pub output: &'a str,
    pub watch_dir: Option<&'a Path>,
    pub non_recursive: bool,
}

pub fn run(cmd: MonitorCommandConfig) {
    let (config, file) = resolve_config(SamplerConfig::monitor(), &cmd.overrides);

    let shutdown = Shutdown::new();
    install_ctrlc(&shutdown);

    // Subscribe before sampling starts so a bad path fails fast.
    let watch_dir = cmd.watch_dir.or(file.watch.as_deref());
    let recursive = !cmd.non_recursive && file.recursive.unwrap_or(true);
    let watcher = watch_dir.map(|dir| {
        let watch = WatchLoop::subscribe(dir, recursive).unwrap_or_else(|e| fail(e));
        let s = shutdown.clone();
        thread::Builder::new()
            .name("hostpulse-watch".to_string())
            .spawn(move || watch.run(&s))
            .unwrap_or_else(|e| fail(format!("cannot start watch thread: {e}")))
    });

    let sink: Box<dyn Sink> = match cmd.output {
        "log" => Box::new(LogSink),
        "json" => Box::new(JsonSink::stdout()),
        _ => Box::new(TerminalSink::stdout()),
    };

    let probes = ProbeSet::system(&config.probes, config.probe_timeout);
    let catalog = probe_catalog();
    for kind in &config.probes {
        let available = catalog.iter().any(|(info, ok)| info.kind == *kind && *ok);
        if !available {
            warn!("probe '{kind}' is not available on this machine; it will report N/A");
        }
    }

    let mut sampler = Sampler::new(probes, DeltaEngine::new(), sink, &config);
    sampler.run(&shutdown);

    // The sampler may stop on its cycle bound; the watcher must stop too.
    shutdown.trigger();
    if let Some(handle) = watcher {
        if handle.join().is_err() {
            warn!("watch thread panicked");
        }
    }
}
