//! Locating the engine executable, once per process.
//!
//! Packaged hosts often run with a minimal `PATH`, so the well-known
//! install locations are probed directly before falling back to `which`.
//! The result is cached for the process lifetime.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

/// Single-initialization cache for the engine executable path.
///
/// The probe runs at most once per cache; construct with
/// [`ExecutableCache::with_probe`] to inject a resolver in tests instead of
/// touching the process-wide instance.
pub struct ExecutableCache {
    resolved: OnceLock<Option<PathBuf>>,
    probe: Box<dyn Fn() -> Option<PathBuf> + Send + Sync>,
}

impl ExecutableCache {
    pub fn new() -> Self {
        Self::with_probe(Box::new(probe_well_known_locations))
    }

    pub fn with_probe(probe: Box<dyn Fn() -> Option<PathBuf> + Send + Sync>) -> Self {
        Self {
            resolved: OnceLock::new(),
            probe,
        }
    }

    /// Returns the engine executable path, probing on first use.
    pub fn get(&self) -> Option<PathBuf> {
        self.resolved.get_or_init(|| (self.probe)()).clone()
    }
}

impl Default for ExecutableCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide cache used when a session has no explicit engine path.
pub fn shared_cache() -> &'static ExecutableCache {
    static CACHE: OnceLock<ExecutableCache> = OnceLock::new();
    CACHE.get_or_init(ExecutableCache::new)
}

const ENGINE_BINARY: &str = "claude";

fn probe_well_known_locations() -> Option<PathBuf> {
    for candidate in candidate_paths() {
        if probe_version(&candidate) {
            return Some(candidate);
        }
    }
    which_fallback()
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("/usr/local/bin").join(ENGINE_BINARY),
        PathBuf::from("/opt/homebrew/bin").join(ENGINE_BINARY),
    ];
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        for rel in [".npm-global/bin", ".local/bin", ".claude/bin"] {
            paths.push(home.join(rel).join(ENGINE_BINARY));
        }
    }
    paths
}

/// Runs `<path> --version` to confirm the candidate is a live executable.
fn probe_version(path: &Path) -> bool {
    Command::new(path)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Last resort: `which`, with the common install directories appended to
/// `PATH` in case the host environment stripped them.
fn which_fallback() -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    for extra in extra_path_dirs() {
        if !entries.contains(&extra) {
            entries.push(extra);
        }
    }
    let joined = std::env::join_paths(entries).ok()?;

    let output = Command::new("which")
        .arg(ENGINE_BINARY)
        .env("PATH", joined)
        .stdin(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if found.is_empty() {
        None
    } else {
        Some(PathBuf::from(found))
    }
}

fn extra_path_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/local/bin"),
        PathBuf::from("/opt/homebrew/bin"),
        PathBuf::from("/usr/bin"),
        PathBuf::from("/bin"),
    ];
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        for rel in [".npm-global/bin", ".nvm/current/bin", ".local/bin", ".claude/bin"] {
            dirs.push(home.join(rel));
        }
    }
    dirs
}
