//! Error handling for hostctl.
use std::path::PathBuf;

use thiserror::Error;

/// Defines all possible errors that can occur while managing hosts and services.
#[derive(Debug, Error)]
pub enum ManageError {
    /// A host with a certificate directory is already provisioned for the domain.
    #[error("Domain '{domain}' already exists")]
    AlreadyExists {
        /// The domain that was requested.
        domain: String,
    },

    /// No certificate directory exists for the domain.
    #[error("Domain '{domain}' does not exist")]
    NotFound {
        /// The domain that was requested.
        domain: String,
    },

    /// Domain, container name or port rejected before touching the filesystem.
    #[error("Invalid host: {0}")]
    InvalidHost(String),

    /// A filesystem operation failed.
    #[error("{context} ({}): {source}", .path.display())]
    Io {
        /// What was being attempted.
        context: &'static str,
        /// The path involved.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// An external program could not be started at all.
    #[error("Failed to launch {step} command '{program}': {source}")]
    SubprocessLaunch {
        /// The orchestration step the program was run for.
        step: &'static str,
        /// The program that was executed.
        program: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// An external program ran and exited unsuccessfully.
    #[error("{step} command exited with status {}", describe_code(.code))]
    SubprocessFailed {
        /// The orchestration step the program was run for.
        step: &'static str,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
    },

    /// The system user that should own certificate material could not be resolved.
    #[error("Could not find user '{user}': {reason}")]
    UserLookupFailed {
        /// The username that was looked up.
        user: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// Error reading the settings file.
    #[error("Failed to read settings file: {0}")]
    ConfigRead(std::io::Error),

    /// Error parsing YAML settings.
    #[error("Invalid YAML format: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// A `${VAR}` reference in the settings file has no value.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Error for the host index.
    #[error("Host index error: {0}")]
    Index(#[from] HostIndexError),

    /// Nothing records which container a domain proxies to.
    #[error("No container binding recorded for '{domain}'")]
    NoContainerBinding {
        /// The domain whose binding is unknown.
        domain: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

impl ManageError {
    /// Wraps an I/O error with the attempted action and the path it touched.
    pub fn io(
        context: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        ManageError::Io {
            context,
            path: path.into(),
            source,
        }
    }
}

/// Error type for host index operations.
#[derive(Debug, Error)]
pub enum HostIndexError {
    /// Error reading or writing the index file.
    #[error("Failed to access host index: {0}")]
    Access(#[from] std::io::Error),

    /// Error parsing JSON contents of the index file.
    #[error("Failed to parse host index: {0}")]
    Parse(#[from] serde_json::Error),

    /// Error taking the advisory lock guarding the index.
    #[error("Failed to lock host index {}: {source}", .path.display())]
    Lock {
        /// The lock file path.
        path: PathBuf,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// Attempted to remove a domain that is not indexed.
    #[error("Domain not found in host index")]
    DomainNotFound,
}
