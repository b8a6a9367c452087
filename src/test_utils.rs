//! Fake external programs for tests.
//!
//! The ACME client and the supervisor control command are replaced by small
//! shell scripts that append their arguments to a log file.
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, OnceLock},
};

/// Serializes tests that mutate process environment variables.
pub static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Takes [`ENV_LOCK`], recovering from a poisoned lock.
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Writes an executable `sh` script named `name` into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("failed to chmod script");
    path
}

/// A script that records its arguments to `log`, one invocation per line, and
/// exits with `exit_code`.
pub fn recording_script(dir: &Path, name: &str, log: &Path, exit_code: i32) -> PathBuf {
    write_script(
        dir,
        name,
        &format!("echo \"$@\" >> '{}'\nexit {exit_code}", log.display()),
    )
}

/// A supervisor stand-in that records `restart <svc>` calls and fails for
/// every service listed in `failing`.
pub fn supervisor_script(dir: &Path, log: &Path, failing: &[&str]) -> PathBuf {
    let mut body = format!("echo \"$@\" >> '{}'\n", log.display());
    for service in failing {
        body.push_str(&format!("if [ \"$2\" = \"{service}\" ]; then exit 1; fi\n"));
    }
    body.push_str("exit 0");
    write_script(dir, "supervisorctl", &body)
}

/// Shell line appending the invocation to `journal` with a `tag` prefix, so
/// several fake programs can share one ordered log.
pub fn journal_line(journal: &Path, tag: &str) -> String {
    format!("echo \"{tag} $@\" >> '{}'", journal.display())
}

/// Lines written by a recording script; empty when it never ran.
pub fn recorded_lines(log: &Path) -> Vec<String> {
    fs::read_to_string(log)
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}
