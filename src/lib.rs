//! hostctl provisions reverse-proxy hosts on a container-hosting box. For a
//! domain and a target container it writes an nginx virtual-host file, drives
//! acme.sh to issue and install a TLS certificate, and adds the HTTPS block
//! that proxies to the container. It also restarts services through the
//! process supervisor's control command.
//!
//! Every operation is synchronous and runs its external programs one after
//! another. Nothing locks the per-domain vhost and certificate paths, so two
//! concurrent invocations against the same domain race on the filesystem.

/// ACME client adapter.
pub mod acme;

/// CLI interface.
pub mod cli;

/// Settings management.
pub mod config;

/// Default paths and command names.
pub mod constants;

/// Error handling.
pub mod error;

/// Host lifecycle manager.
pub mod host;

/// Persistent container bindings.
pub mod index;

/// Per-domain paths.
pub mod layout;

/// Certificate directory ownership.
pub mod privilege;

/// Supervisor restart adapter.
pub mod restart;

/// Virtual-host templates.
pub mod template;

#[doc(hidden)]
pub mod test_utils;
