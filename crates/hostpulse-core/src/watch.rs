//! Watch loop: logs filesystem change notifications under one directory.
//!
//! Setup is the only fatal step. Once subscribed, runtime errors are logged
//! and counted, and the loop keeps going until the channel closes or the
//! shutdown signal fires.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{debug, info, warn};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::WatchError;
use crate::shutdown::Shutdown;

/// How long one wait for a notification lasts before re-checking shutdown.
const RECV_SLICE: Duration = Duration::from_millis(100);

/// Coarse classification of a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Write,
    Create,
    Remove,
    Other,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write => write!(f, "write"),
            Self::Create => write!(f, "create"),
            Self::Remove => write!(f, "remove"),
            Self::Other => write!(f, "other"),
        }
    }
}

pub fn classify(event: &Event) -> ChangeKind {
    match event.kind {
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
            ChangeKind::Write
        }
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Remove(_) => ChangeKind::Remove,
        _ => ChangeKind::Other,
    }
}

/// Counters reported when a watch loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    /// Notifications received, of any kind.
    pub events: u64,
    pub writes: u64,
    /// Runtime subscription errors.
    pub errors: u64,
}

/// An established subscription on one directory.
pub struct WatchLoop {
    path: PathBuf,
    // Dropping the watcher ends the subscription.
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
}

impl WatchLoop {
    pub fn subscribe(path: impl AsRef<Path>, recursive: bool) -> Result<Self, WatchError> {
        let path = path.as_ref().to_path_buf();
        let setup_failed = |source: notify::Error| WatchError::SetupFailed {
            path: path.clone(),
            source,
        };

        std::fs::metadata(&path).map_err(|e| setup_failed(notify::Error::io(e)))?;

        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default()).map_err(setup_failed)?;
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&path, mode).map_err(setup_failed)?;

        info!(
            "watching {} ({})",
            path.display(),
            if recursive { "recursive" } else { "non-recursive" }
        );
        Ok(Self {
            path,
            _watcher: watcher,
            events: rx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Process notifications until shutdown. Consumes the subscription.
    pub fn run(self, shutdown: &Shutdown) -> WatchStats {
        let stats = drain(&self.events, shutdown);
        info!(
            "stopped watching {}: {} event(s), {} write(s), {} error(s)",
            self.path.display(),
            stats.events,
            stats.writes,
            stats.errors
        );
        stats
    }
}

/// Consume notifications from `events` until the channel closes or
/// `shutdown` fires.
pub fn drain(events: &Receiver<notify::Result<Event>>, shutdown: &Shutdown) -> WatchStats {
    let mut stats = WatchStats::default();
    while !shutdown.is_triggered() {
        match events.recv_timeout(RECV_SLICE) {
            Ok(Ok(event)) => record(&mut stats, &event),
            Ok(Err(e)) => {
                stats.errors += 1;
                warn!("watch error: {e}");
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("watch channel closed");
                break;
            }
        }
    }
    stats
}

/// Count and log one notification. Every kind is logged at info level;
/// writes get an extra "modified file" line.
fn record(stats: &mut WatchStats, event: &Event) {
    stats.events += 1;
    let paths = event
        .paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let kind = classify(event);
    info!("{kind} event ({:?}): {paths}", event.kind);
    if kind == ChangeKind::Write {
        stats.writes += 1;
        info!("modified file: {paths}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, LevelFilter};
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::sync::Mutex;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn classify_kinds() {
        let write = event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/a");
        assert_eq!(classify(&write), ChangeKind::Write);
        let create = event(EventKind::Create(CreateKind::File), "/a");
        assert_eq!(classify(&create), ChangeKind::Create);
        let remove = event(EventKind::Remove(RemoveKind::File), "/a");
        assert_eq!(classify(&remove), ChangeKind::Remove);
        let chmod = event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)), "/a");
        assert_eq!(classify(&chmod), ChangeKind::Other);
    }

    static CAPTURED: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

    struct Capture;

    impl log::Log for Capture {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= Level::Info
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                CAPTURED
                    .lock()
                    .unwrap()
                    .push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture;

    fn info_lines_mentioning(needle: &str) -> Vec<String> {
        CAPTURED
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, line)| *level == Level::Info && line.contains(needle))
            .map(|(_, line)| line.clone())
            .collect()
    }

    #[test]
    fn every_event_kind_is_logged_at_info() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(LevelFilter::Info);

        let mut stats = WatchStats::default();
        record(&mut stats, &event(EventKind::Create(CreateKind::File), "/w/created.txt"));
        record(&mut stats, &event(EventKind::Remove(RemoveKind::File), "/w/removed.txt"));
        record(
            &mut stats,
            &event(EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)), "/w/chmod.txt"),
        );
        record(
            &mut stats,
            &event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), "/w/written.txt"),
        );

        assert_eq!(stats.events, 4);
        assert_eq!(stats.writes, 1);
        assert!(info_lines_mentioning("/w/created.txt")[0].starts_with("create event"));
        assert!(info_lines_mentioning("/w/removed.txt")[0].starts_with("remove event"));
        assert!(info_lines_mentioning("/w/chmod.txt")[0].starts_with("other event"));
        let written = info_lines_mentioning("/w/written.txt");
        assert_eq!(written.len(), 2);
        assert!(written.iter().any(|l| l == "modified file: /w/written.txt"));
    }

    #[test]
    fn errors_are_counted_and_loop_continues() {
        let (tx, rx) = mpsc::channel();
        tx.send(Err(notify::Error::generic("queue overflow"))).unwrap();
        tx.send(Ok(event(EventKind::Modify(ModifyKind::Data(DataChange::Any)), "/tmp/x")))
            .unwrap();
        tx.send(Ok(event(EventKind::Create(CreateKind::File), "/tmp/y")))
            .unwrap();
        drop(tx);

        let stats = drain(&rx, &Shutdown::new());
        assert_eq!(
            stats,
            WatchStats {
                events: 2,
                writes: 1,
                errors: 1
            }
        );
    }

    #[test]
    fn closed_channel_ends_loop() {
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        drop(tx);
        assert_eq!(drain(&rx, &Shutdown::new()), WatchStats::default());
    }

    #[test]
    fn shutdown_ends_loop() {
        let (_tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            remote.trigger();
        });
        let stats = drain(&rx, &shutdown);
        handle.join().unwrap();
        assert_eq!(stats.events, 0);
    }

    #[test]
    fn subscribe_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        match WatchLoop::subscribe(&missing, true) {
            Err(WatchError::SetupFailed { path, .. }) => assert_eq!(path, missing),
            Ok(_) => panic!("subscribing to a missing path should fail"),
        }
    }

    #[test]
    fn subscribe_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let watch = WatchLoop::subscribe(dir.path(), false).unwrap();
        assert_eq!(watch.path(), dir.path());

        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let shutdown = Shutdown::new();
        let remote = shutdown.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(750));
            remote.trigger();
        });
        let stats = watch.run(&shutdown);
        handle.join().unwrap();
        assert!(stats.events >= 1, "no events for a new file: {stats:?}");
        assert_eq!(stats.errors, 0);
    }
}
