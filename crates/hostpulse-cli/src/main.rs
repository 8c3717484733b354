//! CLI for hostpulse — live host statistics and file change logging.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hostpulse")]
#[command(about = "hostpulse — live host statistics and file change logging")]
#[command(version = hostpulse_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List probes, their platform, and whether they work on this machine
    Scan {
        /// Print the probe list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Live resource monitor: window, CPU, memory, GPU and network throughput
    Monitor {
        /// Refresh period (e.g. 500ms, 5s, 1m) [default: 5s]
        #[arg(long)]
        interval: Option<String>,

        /// Comma-separated probe filter: window,cpu,memory,gpu,network
        #[arg(long)]
        probes: Option<String>,

        /// Output: text (redrawn frame), log (one line per cycle), json (one object per cycle)
        #[arg(long, default_value = "text", value_parser = ["text", "log", "json"])]
        output: String,

        /// Also log file changes under this directory
        #[arg(long)]
        watch: Option<PathBuf>,

        /// Watch only the top level of --watch
        #[arg(long)]
        non_recursive: bool,

        /// Stop after N cycles
        #[arg(long)]
        cycles: Option<u64>,

        /// Upper bound for one external command (e.g. 2s)
        #[arg(long)]
        probe_timeout: Option<String>,

        /// TOML config file; command-line flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Log the foreground application and window title on every tick
    Window {
        /// Poll period [default: 1s]
        #[arg(long)]
        interval: Option<String>,

        /// Stop after N samples
        #[arg(long)]
        cycles: Option<u64>,

        /// Upper bound for one osascript call
        #[arg(long)]
        probe_timeout: Option<String>,

        /// TOML config file; command-line flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Log file changes under a directory until Ctrl+C
    Watch {
        /// Directory to watch
        dir: PathBuf,

        /// Watch only the top level of DIR
        #[arg(long)]
        non_recursive: bool,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { json } => commands::scan::run(json),
        Commands::Monitor {
            interval,
            probes,
            output,
            watch,
            non_recursive,
            cycles,
            probe_timeout,
            config,
        } => commands::monitor::run(commands::monitor::MonitorCommandConfig {
            overrides: commands::Overrides {
                config_path: config.as_deref(),
                interval: interval.as_deref(),
                probe_timeout: probe_timeout.as_deref(),
                probes: probes.as_deref(),
                cycles,
            },
            output: &output,
            watch_dir: watch.as_deref(),
            non_recursive,
        }),
        Commands::Window {
            interval,
            cycles,
            probe_timeout,
            config,
        } => commands::window::run(commands::Overrides {
            config_path: config.as_deref(),
            interval: interval.as_deref(),
            probe_timeout: probe_timeout.as_deref(),
            probes: None,
            cycles,
        }),
        Commands::Watch { dir, non_recursive } => commands::watch::run(&dir, !non_recursive),
    }
}
