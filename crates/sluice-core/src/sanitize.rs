//! Cleanup of raw terminal diagnostics before they reach a client.
//!
//! Pass order matters: escape-sequence stripping must run before blank-line
//! collapsing, so stripped sequences cannot reintroduce blank runs.

use std::sync::OnceLock;

use regex::Regex;

fn csi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Cursor movement, colors, erase commands.
    RE.get_or_init(|| Regex::new("\x1B\\[[0-9;]*[a-zA-Z]").unwrap())
}

fn osc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Operating-system commands, terminated by BEL or ESC-backslash.
    RE.get_or_init(|| Regex::new("\x1B\\][^\x07\x1B]*(?:\x07|\x1B\\\\)").unwrap())
}

fn charset_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\x1B\\([A-Z]").unwrap())
}

fn keypad_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\x1B[=>]").unwrap())
}

fn control_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Remaining C0 controls, keeping \t \n \r for the line-ending pass.
    RE.get_or_init(|| Regex::new("[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap())
}

fn blank_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("\n{3,}").unwrap())
}

/// Strips terminal control sequences and normalizes whitespace.
///
/// Idempotent. Callers should drop the output entirely when the cleaned
/// result is empty.
pub fn clean_terminal_output(raw: &str) -> String {
    let text = csi_re().replace_all(raw, "");
    let text = osc_re().replace_all(&text, "");
    let text = charset_re().replace_all(&text, "");
    let text = keypad_re().replace_all(&text, "");
    let text = control_re().replace_all(&text, "");
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = blank_run_re().replace_all(&text, "\n\n");
    text.trim().to_string()
}
