//! Constants and default values for hostctl.
//!
//! The default paths reproduce the layout the web server and the ACME client
//! expect on the container-hosting box; any of them can be overridden from the
//! settings file.

// ============================================================================
// Settings
// ============================================================================

/// Settings file read when `--config` is not given and the file exists.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/manage/manage.yaml";

// ============================================================================
// File System Layout
// ============================================================================

/// Base directory holding one web root per domain.
pub const DEFAULT_WEB_ROOT: &str = "/var/www";

/// Directory the web server loads virtual-host files from.
pub const DEFAULT_VHOST_DIR: &str = "/etc/nginx/conf.d";

/// Root directory holding one certificate directory per domain.
pub const DEFAULT_CERT_ROOT: &str = "/etc/sslcerts";

/// Home of the ACME client; holds its per-domain state directories.
pub const DEFAULT_ACME_HOME: &str = "/root/.acme.sh";

/// Directory the web server writes per-domain logs to.
pub const DEFAULT_NGINX_LOG_DIR: &str = "/var/log/nginx";

/// Persistent index of container bindings.
pub const DEFAULT_INDEX_FILE: &str = "/var/lib/manage/hosts.json";

/// Suffix of the advisory lock file placed next to the index.
pub const INDEX_LOCK_SUFFIX: &str = ".lock";

/// Extension of virtual-host files.
pub const VHOST_FILE_EXTENSION: &str = "conf";

/// Path of the HTTP-01 challenge directory relative to a domain's web root.
pub const ACME_CHALLENGE_SUBDIR: &str = ".well-known/acme-challenge";

/// File names of the installed certificate material.
pub const CERT_FILE_NAME: &str = "cert.pem";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const FULLCHAIN_FILE_NAME: &str = "fullchain.pem";

/// Mode of certificate directories.
pub const CERT_DIR_MODE: u32 = 0o700;

// ============================================================================
// External Programs
// ============================================================================

/// ACME client executable.
pub const DEFAULT_ACME_CLIENT: &str = "/root/.acme.sh/acme.sh";

/// Process supervisor control command.
pub const DEFAULT_SUPERVISOR_CTL: &str = "immortalctl";

/// Supervisor subcommand used to restart a service.
pub const SUPERVISOR_RESTART_VERB: &str = "restart";

/// Supervisor service name of the web server.
pub const DEFAULT_WEB_SERVER_SERVICE: &str = "nginx";

/// System user owning certificate directories.
pub const DEFAULT_WEB_SERVER_USER: &str = "nginx";

/// Command the ACME client runs after installing or renewing a certificate.
pub const DEFAULT_RELOAD_COMMAND: &str = "manage restart nginx";

// ============================================================================
// Host Validation
// ============================================================================

/// Default upstream port when `-p` is not given.
pub const DEFAULT_CONTAINER_PORT: u16 = 80;

/// Longest fully-qualified domain name accepted.
pub const MAX_DOMAIN_LEN: usize = 253;
