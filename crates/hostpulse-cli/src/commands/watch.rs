use std::path::Path;

use hostpulse_core::{Shutdown, WatchLoop};

use super::{fail, install_ctrlc};

pub fn run(dir: &Path, recursive: bool) {
    let watch = WatchLoop::subscribe(dir, recursive).unwrap_or_else(|e| fail(e));

    let shutdown = Shutdown::new();
    install_ctrlc(&shutdown);

    println!("Watching {} (Ctrl+C to stop)", watch.path().display());
    let stats = watch.run(&shutdown);
    println!(
        "{} event(s), {} write(s), {} error(s)",
        stats.events, stats.writes, stats.errors
    );
}
