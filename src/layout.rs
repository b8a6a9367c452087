//! Per-domain filesystem layout.
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::constants::{
    ACME_CHALLENGE_SUBDIR, CERT_FILE_NAME, FULLCHAIN_FILE_NAME, KEY_FILE_NAME,
    VHOST_FILE_EXTENSION,
};

/// Roots every domain-keyed path is derived from.
///
/// All methods are pure functions of the domain; nothing here touches disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostLayout {
    web_root: PathBuf,
    vhost_dir: PathBuf,
    cert_root: PathBuf,
    acme_home: PathBuf,
    log_dir: PathBuf,
}

impl HostLayout {
    /// Builds the layout from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            web_root: settings.web_root.clone(),
            vhost_dir: settings.vhost_dir.clone(),
            cert_root: settings.cert_root.clone(),
            acme_home: settings.acme_home.clone(),
            log_dir: settings.nginx_log_dir.clone(),
        }
    }

    /// `<web-root>/<domain>`
    pub fn webroot(&self, domain: &str) -> PathBuf {
        self.web_root.join(domain)
    }

    /// `<web-root>/<domain>/.well-known/acme-challenge`
    pub fn challenge_dir(&self, domain: &str) -> PathBuf {
        self.webroot(domain).join(ACME_CHALLENGE_SUBDIR)
    }

    /// `<vhost-dir>/<domain>.conf`
    pub fn vhost_file(&self, domain: &str) -> PathBuf {
        self.vhost_dir
            .join(format!("{domain}.{VHOST_FILE_EXTENSION}"))
    }

    /// Directory whose subdirectories name every issued certificate.
    pub fn cert_root(&self) -> &Path {
        &self.cert_root
    }

    /// `<cert-root>/<domain>`
    pub fn cert_dir(&self, domain: &str) -> PathBuf {
        self.cert_root.join(domain)
    }

    pub fn cert_file(&self, domain: &str) -> PathBuf {
        self.cert_dir(domain).join(CERT_FILE_NAME)
    }

    pub fn key_file(&self, domain: &str) -> PathBuf {
        self.cert_dir(domain).join(KEY_FILE_NAME)
    }

    pub fn fullchain_file(&self, domain: &str) -> PathBuf {
        self.cert_dir(domain).join(FULLCHAIN_FILE_NAME)
    }

    /// The ACME client's own state for the domain. Only ever removed.
    pub fn acme_state_dir(&self, domain: &str) -> PathBuf {
        self.acme_home.join(domain)
    }

    /// Directory the web server writes per-domain logs to.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}
