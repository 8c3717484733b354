//! Text rendering of snapshots: the live frame and the single log line.

use std::fmt::Write as _;

use crate::probe::{CpuReading, GpuStatus, MemoryReading, WindowInfo};
use crate::sampler::{Metric, NetworkThroughput, Snapshot};

/// Width of a percentage gauge in cells.
pub const BAR_WIDTH: usize = 50;

const PLACEHOLDER: &str = "N/A";
const GPU_ERROR_LABEL: &str = "N/A (requires Metal-compatible GPU)";

/// Human-readable byte count with 1024-based prefixes.
///
/// Whole bytes below 1 KB, otherwise two decimals of the largest prefix
/// whose scaled value stays below 1024.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let prefixes = ['K', 'M', 'G', 'T', 'P', 'E'];
    let mut div = UNIT;
    let mut exp = 0usize;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < prefixes.len() - 1 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    format!("{:.2} {}B", bytes as f64 / div as f64, prefixes[exp])
}

/// Per-second rate; fractional bytes are dropped.
pub fn format_rate(bytes_per_second: f64) -> String {
    let whole = if bytes_per_second.is_finite() && bytes_per_second > 0.0 {
        bytes_per_second.floor() as u64
    } else {
        0
    };
    format!("{}/s", format_bytes(whole))
}

/// `█`/`░` gauge for a percentage, clamped to `[0, 100]`.
pub fn usage_bar(percent: f64) -> String {
    let pct = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((pct / 2.0).floor() as usize).min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH * 3);
    bar.extend(std::iter::repeat_n('█', filled));
    bar.extend(std::iter::repeat_n('░', BAR_WIDTH - filled));
    bar
}

/// Full display frame for one snapshot. Lines are `\n`-separated; the
/// terminal sink converts them for raw output.
pub fn render_frame(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
    out.push_str("║              hostpulse - Live System Statistics              ║\n");
    out.push_str("╚══════════════════════════════════════════════════════════════╝\n\n");

    if let Some(window) = &snapshot.window {
        window_section(&mut out, window);
        out.push('\n');
    }
    if let Some(cpu) = &snapshot.cpu {
        cpu_section(&mut out, cpu);
        out.push('\n');
    }
    if let Some(memory) = &snapshot.memory {
        memory_section(&mut out, memory);
        out.push('\n');
    }
    if let Some(gpu) = &snapshot.gpu {
        let _ = writeln!(out, "GPU: {}", gpu_label(gpu));
        out.push('\n');
    }
    if let Some(network) = &snapshot.network {
        network_section(&mut out, network);
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "Last updated: {}",
        snapshot.collected_at().format("%H:%M:%S")
    );
    out.push_str("\n[Press Ctrl+C to exit]\n");
    out
}

fn window_section(out: &mut String, window: &Metric<WindowInfo>) {
    match window {
        Metric::Ready(w) => {
            let _ = writeln!(out, "Active App: {}", w.app_name);
            let title = if w.window_title.is_empty() { "-" } else { &w.window_title };
            let _ = writeln!(out, "   Window: {title}");
        }
        Metric::Unavailable { reason, .. } => {
            let _ = writeln!(out, "Active App: Error - {reason}");
        }
    }
}

fn cpu_section(out: &mut String, cpu: &Metric<CpuReading>) {
    match cpu {
        Metric::Ready(c) => {
            let _ = writeln!(
                out,
                "CPU Usage: {:.2}% ({} cores)",
                c.usage_percent, c.logical_cores
            );
            let _ = writeln!(out, "   [{}]", usage_bar(c.usage_percent));
        }
        Metric::Unavailable { reason, .. } => {
            let _ = writeln!(out, "CPU: Error - {reason}");
        }
    }
}

fn memory_section(out: &mut String, memory: &Metric<MemoryReading>) {
    match memory {
        Metric::Ready(m) => {
            let _ = writeln!(
                out,
                "RAM Usage: {:.2}% (Used: {} / Total: {})",
                m.used_percent,
                format_bytes(m.used_bytes),
                format_bytes(m.total_bytes)
            );
            let _ = writeln!(out, "   [{}]", usage_bar(m.used_percent));
        }
        Metric::Unavailable { reason, .. } => {
            let _ = writeln!(out, "RAM: Error - {reason}");
        }
    }
}

fn network_section(out: &mut String, network: &Metric<NetworkThroughput>) {
    match network {
        Metric::Ready(NetworkThroughput::Warming) => {
            out.push_str("Network Usage:\n  (Calculating...)\n");
        }
        Metric::Ready(NetworkThroughput::Measured(rates)) => {
            out.push_str("Network Usage:\n");
            let _ = writeln!(out, "  ↑ Upload:   {}", format_rate(rates.upload_per_second));
            let _ = writeln!(out, "  ↓ Download: {}", format_rate(rates.download_per_second));
            if !rates.active_interfaces.is_empty() {
                let _ = writeln!(out, "  Active: {}", rates.active_interfaces.join(", "));
            }
        }
        Metric::Unavailable { reason, .. } => {
            let _ = writeln!(out, "Network: Error - {reason}");
        }
    }
}

fn gpu_label(gpu: &Metric<GpuStatus>) -> &'static str {
    match gpu {
        Metric::Ready(status) => status.label(),
        Metric::Unavailable { .. } => GPU_ERROR_LABEL,
    }
}

/// One-line summary of a snapshot. Only configured metrics appear;
/// unavailable ones read `N/A`.
pub fn format_log_line(snapshot: &Snapshot) -> String {
    let mut fields = vec![format!("Time: {}", snapshot.collected_at().to_rfc3339())];

    if let Some(window) = &snapshot.window {
        match window.ready() {
            Some(w) => {
                fields.push(format!("App: {}", w.app_name));
                fields.push(format!("Title: {}", w.window_title));
            }
            None => {
                fields.push(format!("App: {PLACEHOLDER}"));
                fields.push(format!("Title: {PLACEHOLDER}"));
            }
        }
    }
    if let Some(cpu) = &snapshot.cpu {
        fields.push(format!(
            "CPU: {}",
            cpu.ready()
                .map_or_else(|| PLACEHOLDER.to_string(), |c| format!("{:.2}%", c.usage_percent))
        ));
    }
    if let Some(memory) = &snapshot.memory {
        fields.push(format!(
            "RAM: {}",
            memory
                .ready()
                .map_or_else(|| PLACEHOLDER.to_string(), |m| format!("{:.2}%", m.used_percent))
        ));
    }
    if let Some(gpu) = &snapshot.gpu {
        let label = match gpu.ready() {
            Some(GpuStatus::Active) => "Active",
            Some(GpuStatus::NotAvailable) | None => PLACEHOLDER,
        };
        fields.push(format!("GPU: {label}"));
    }
    if let Some(network) = &snapshot.network {
        let net = match network.ready() {
            Some(NetworkThroughput::Measured(rates)) => format!(
                "↑ {} ↓ {}",
                format_rate(rates.upload_per_second),
                format_rate(rates.download_per_second)
            ),
            Some(NetworkThroughput::Warming) => "calculating".to_string(),
            None => PLACEHOLDER.to_string(),
        };
        fields.push(format!("Net: {net}"));
    }

    fields.join(" | ")
}
