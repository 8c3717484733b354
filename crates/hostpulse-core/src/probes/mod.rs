//! Probe implementations, one per platform mechanism.

pub mod cpu;
pub mod gpu;
pub mod memory;
pub mod network;
pub mod window;

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::error::ProbeError;
use crate::probe::{Probe, ProbeInfo};

pub use cpu::CpuProbe;
pub use gpu::{GpuProbe, classify_ioreg_output};
pub use memory::MemoryProbe;
pub use network::NetworkProbe;
pub use window::{WindowProbe, parse_window_output};

/// Default upper bound for one external command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Availability report for every built-in probe, in sampling order.
pub fn probe_catalog() -> Vec<(ProbeInfo, bool)> {
    let window = WindowProbe::new(DEFAULT_COMMAND_TIMEOUT);
    let cpu = CpuProbe::new();
    let memory = MemoryProbe::new();
    let gpu = GpuProbe::new(DEFAULT_COMMAND_TIMEOUT);
    let network = NetworkProbe::new();

    vec![
        (window.info().clone(), window.is_available()),
        (cpu.info().clone(), cpu.is_available()),
        (memory.info().clone(), memory.is_available()),
        (gpu.info().clone(), gpu.is_available()),
        (network.info().clone(), network.is_available()),
    ]
}

/// Run a subprocess and return its trimmed stdout.
///
/// The whole call, including collecting output, is bounded by `timeout`; on
/// timeout the child is killed and reaped. Non-zero exit and spawn failures
/// are `ExecutionFailed`. Pipes are drained on helper threads so a chatty
/// child cannot block on a full pipe, and a grandchild that keeps a pipe
/// open cannot hold the caller past the deadline.
pub fn run_command(program: &str, args: &[&str], timeout: Duration) -> Result<String, ProbeError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ProbeError::execution_failed(format!("cannot start {program}: {e}")))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let timed_out = || {
        ProbeError::execution_failed(format!(
            "{program} timed out after {}ms",
            timeout.as_millis()
        ))
    };

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(timed_out());
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(ProbeError::execution_failed(format!(
                    "waiting for {program}: {e}"
                )));
            }
        }
    };

    if !status.success() {
        let err = collect(&stderr, deadline).unwrap_or_default();
        let err = String::from_utf8_lossy(&err);
        let err = err.trim();
        return Err(ProbeError::execution_failed(if err.is_empty() {
            format!("{program} exited with {status}")
        } else {
            format!("{program} exited with {status}: {err}")
        }));
    }

    let out = collect(&stdout, deadline).ok_or_else(timed_out)?;
    Ok(String::from_utf8_lossy(&out).trim().to_string())
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a drained pipe until `deadline`. `None` means the pipe is still
/// held open by someone.
fn collect(pipe: &Receiver<Vec<u8>>, deadline: Instant) -> Option<Vec<u8>> {
    match pipe.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}
