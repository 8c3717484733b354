pub mod monitor;
pub mod scan;
pub mod watch;
pub mod window;

use std::fmt::Display;
use std::path::Path;

use hostpulse_core::{
    ConfigError, FileConfig, SamplerConfig, Shutdown, parse_duration, parse_probe_list,
};

/// Command-line values layered over a config file and the built-in preset.
pub struct Overrides<'a> {
    pub config_path: Option<&'a Path>,
    pub interval: Option<&'a str>,
    pub probe_timeout: Option<&'a str>,
    pub probes: Option<&'a str>,
    pub cycles: Option<u64>,
}

/// Preset, then file, then flags. Exits on invalid configuration.
pub fn resolve_config(preset: SamplerConfig, overrides: &Overrides) -> (SamplerConfig, FileConfig) {
    match try_resolve(preset, overrides) {
        Ok(resolved) => resolved,
        Err(e) => fail(e),
    }
}

fn try_resolve(
    mut config: SamplerConfig,
    overrides: &Overrides,
) -> Result<(SamplerConfig, FileConfig), ConfigError> {
    let file = match overrides.config_path {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    config.apply_file(&file)?;

    if let Some(interval) = overrides.interval {
        config.interval = parse_duration(interval)?;
    }
    if let Some(timeout) = overrides.probe_timeout {
        config.probe_timeout = parse_duration(timeout)?;
    }
    if let Some(probes) = overrides.probes {
        config.probes = parse_probe_list(probes)?;
    }
    if overrides.cycles.is_some() {
        config.max_cycles = overrides.cycles;
    }

    config.validate()?;
    Ok((config, file))
}

/// Config-file keys a command does not read.
pub fn ignored_keys(file: &FileConfig, used: &[&str]) -> Vec<&'static str> {
    file.present_keys()
        .into_iter()
        .filter(|key| !used.contains(key))
        .collect()
}

/// Trigger `shutdown` on Ctrl+C.
pub fn install_ctrlc(shutdown: &Shutdown) {
    let s = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || s.trigger()) {
        fail(format!("Error setting Ctrl+C handler: {e}"));
    }
}

pub fn fail(msg: impl Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_keys_skips_used_ones() {
        let file = FileConfig {
            interval: Some("2s".to_string()),
            watch: Some("/tmp".into()),
            recursive: Some(false),
            ..FileConfig::default()
        };
        assert_eq!(
            ignored_keys(&file, window::CONFIG_KEYS),
            vec!["watch", "recursive"]
        );
        assert!(ignored_keys(&file, &["interval", "watch", "recursive"]).is_empty());
    }

    #[test]
    fn flags_override_file() {
        let dir = std::env::temp_dir().join(format!("hostpulse-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cfg.toml");
        std::fs::write(&path, "interval = \"2s\"\ncycles = 9\n").unwrap();

        let overrides = Overrides {
            config_path: Some(&path),
            interval: Some("250ms"),
            probe_timeout: None,
            probes: None,
            cycles: None,
        };
        let (config, file) = try_resolve(SamplerConfig::window_poller(), &overrides).unwrap();
        assert_eq!(config.interval, std::time::Duration::from_millis(250));
        assert_eq!(config.max_cycles, Some(9));
        assert_eq!(file.present_keys(), vec!["interval", "cycles"]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
