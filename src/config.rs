//! Configuration management for hostctl.
use regex::Regex;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};
use tracing::debug;

use crate::constants::{
    DEFAULT_ACME_CLIENT, DEFAULT_ACME_HOME, DEFAULT_CERT_ROOT, DEFAULT_INDEX_FILE,
    DEFAULT_NGINX_LOG_DIR, DEFAULT_RELOAD_COMMAND, DEFAULT_SETTINGS_PATH,
    DEFAULT_SUPERVISOR_CTL, DEFAULT_VHOST_DIR, DEFAULT_WEB_ROOT,
    DEFAULT_WEB_SERVER_SERVICE, DEFAULT_WEB_SERVER_USER,
};
use crate::error::ManageError;

/// Represents the structure of the settings file.
///
/// Every field is optional in YAML; omitted fields fall back to the fixed
/// layout expected by nginx and acme.sh on the hosting box.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Base directory holding one web root per domain.
    pub web_root: PathBuf,
    /// Directory of virtual-host files.
    pub vhost_dir: PathBuf,
    /// Root directory of per-domain certificate directories.
    pub cert_root: PathBuf,
    /// ACME client home; per-domain state lives directly beneath it.
    pub acme_home: PathBuf,
    /// ACME client executable.
    pub acme_client: PathBuf,
    /// Supervisor control command.
    pub supervisor_ctl: PathBuf,
    /// Supervisor service name restarted to reload the web server.
    pub web_server_service: String,
    /// System user owning certificate directories.
    pub web_server_user: String,
    /// Command handed to the ACME client as its post-install hook.
    pub reload_command: String,
    /// Directory the HTTPS block sends per-domain logs to.
    pub nginx_log_dir: PathBuf,
    /// Persistent host index.
    pub index_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            web_root: PathBuf::from(DEFAULT_WEB_ROOT),
            vhost_dir: PathBuf::from(DEFAULT_VHOST_DIR),
            cert_root: PathBuf::from(DEFAULT_CERT_ROOT),
            acme_home: PathBuf::from(DEFAULT_ACME_HOME),
            acme_client: PathBuf::from(DEFAULT_ACME_CLIENT),
            supervisor_ctl: PathBuf::from(DEFAULT_SUPERVISOR_CTL),
            web_server_service: DEFAULT_WEB_SERVER_SERVICE.to_string(),
            web_server_user: DEFAULT_WEB_SERVER_USER.to_string(),
            reload_command: DEFAULT_RELOAD_COMMAND.to_string(),
            nginx_log_dir: PathBuf::from(DEFAULT_NGINX_LOG_DIR),
            index_file: PathBuf::from(DEFAULT_INDEX_FILE),
        }
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").expect("valid env var pattern")
    })
}

/// Expands `$VAR` and `${VAR}` references within a string.
fn expand_env_vars(input: &str) -> Result<String, ManageError> {
    let mut missing = None;
    let result = env_var_pattern().replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(ManageError::MissingEnvVar(var_name)),
        None => Ok(result.into_owned()),
    }
}

/// Parses settings from YAML text, expanding environment variables first.
pub fn parse_settings(content: &str) -> Result<Settings, ManageError> {
    let expanded = expand_env_vars(content)?;
    if expanded.trim().is_empty() {
        return Ok(Settings::default());
    }
    let settings: Settings = serde_yaml::from_str(&expanded)?;
    Ok(settings)
}

/// Loads settings.
///
/// An explicit path must exist. Without one, the default settings file is used
/// when present and built-in defaults otherwise.
pub fn load_settings(settings_path: Option<&Path>) -> Result<Settings, ManageError> {
    let path = match settings_path {
        Some(path) => path,
        None => {
            let default = Path::new(DEFAULT_SETTINGS_PATH);
            if !default.exists() {
                debug!("No settings file at {}; using defaults", default.display());
                return Ok(Settings::default());
            }
            default
        }
    };

    let content = fs::read_to_string(path).map_err(|e| {
        ManageError::ConfigRead(std::io::Error::new(
            e.kind(),
            format!("{} ({})", e, path.display()),
        ))
    })?;

    debug!("Loaded settings from {}", path.display());
    parse_settings(&content)
}
