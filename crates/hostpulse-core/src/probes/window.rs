//! WindowProbe — asks System Events (via `osascript`) for the frontmost
//! application and the title of its first window.

use std::time::Duration;

use crate::error::ProbeError;
use crate::probe::{Platform, Probe, ProbeInfo, ProbeKind, WindowInfo};

use super::run_command;

/// Path to the AppleScript interpreter on macOS.
const OSASCRIPT_PATH: &str = "/usr/bin/osascript";

/// Returns `"<appName>,<windowTitle>"`. The title lookup is wrapped in `try`
/// so apps without windows (or without accessibility permission) still
/// report their name.
const FRONT_WINDOW_SCRIPT: &str = r#"
tell application "System Events"
    set frontApp to first application process whose frontmost is true
    set frontAppName to name of frontApp
    set windowTitle to ""
    try
        set windowTitle to name of window 1 of frontApp
    end try
    return frontAppName & "," & windowTitle
end tell
"#;

static WINDOW_INFO: ProbeInfo = ProbeInfo {
    name: "window",
    description: "Frontmost application and window title via AppleScript System Events",
    kind: ProbeKind::Window,
    platform: Platform::MacOS,
};

pub struct WindowProbe {
    timeout: Duration,
}

impl WindowProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Parse `"<appName>,<windowTitle>"`, splitting on the first comma only.
///
/// A missing title field is an empty title, not an error. Output with no
/// application name at all is a parse failure.
pub fn parse_window_output(raw: &str) -> Result<WindowInfo, ProbeError> {
    let raw = raw.trim();
    let (app, title) = raw.split_once(',').unwrap_or((raw, ""));
    let app_name = app.trim();
    if app_name.is_empty() {
        return Err(ProbeError::parse_failed(format!(
            "no application name in osascript output {raw:?}"
        )));
    }
    Ok(WindowInfo {
        app_name: app_name.to_string(),
        window_title: title.trim().to_string(),
    })
}

impl Probe for WindowProbe {
    type Output = WindowInfo;

    fn info(&self) -> &ProbeInfo {
        &WINDOW_INFO
    }

    fn is_available(&self) -> bool {
        cfg!(target_os = "macos") && std::path::Path::new(OSASCRIPT_PATH).exists()
    }

    fn sample(&mut self) -> Result<WindowInfo, ProbeError> {
        if !cfg!(target_os = "macos") {
            return Err(ProbeError::unavailable(
                "foreground window lookup requires macOS System Events",
            ));
        }
        let out = run_command(OSASCRIPT_PATH, &["-e", FRONT_WINDOW_SCRIPT], self.timeout)?;
        parse_window_output(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeErrorKind;

    #[test]
    fn parses_app_and_title() {
        let w = parse_window_output("Safari,My Page").unwrap();
        assert_eq!(w.app_name, "Safari");
        assert_eq!(w.window_title, "My Page");
    }

    #[test]
    fn missing_title_is_empty() {
        let w = parse_window_output("Finder").unwrap();
        assert_eq!(w.app_name, "Finder");
        assert_eq!(w.window_title, "");
    }

    #[test]
    fn trailing_comma_is_empty_title() {
        let w = parse_window_output("Terminal,\n").unwrap();
        assert_eq!(w.app_name, "Terminal");
        assert_eq!(w.window_title, "");
    }

    #[test]
    fn splits_on_first_comma_only() {
        let w = parse_window_output("Mail,Inbox, 3 unread, flagged").unwrap();
        assert_eq!(w.app_name, "Mail");
        assert_eq!(w.window_title, "Inbox, 3 unread, flagged");
    }

    #[test]
    fn empty_output_is_parse_failure() {
        let err = parse_window_output("").unwrap_err();
        assert_eq!(err.kind, ProbeErrorKind::ParseFailed);
        let err = parse_window_output("  \n").unwrap_err();
        assert_eq!(err.kind, ProbeErrorKind::ParseFailed);
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn unavailable_off_macos() {
        let mut probe = WindowProbe::new(Duration::from_millis(100));
        assert!(!probe.is_available());
        assert_eq!(probe.sample().unwrap_err().kind, ProbeErrorKind::Unavailable);
    }
}
