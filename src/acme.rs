//! Adapter around the external ACME client (acme.sh).
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use strum_macros::AsRefStr;
use tracing::{debug, info};

use crate::error::ManageError;

/// One invocation of the ACME client.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum AcmeCommand {
    /// Issue a certificate using the HTTP-01 challenge served from `webroot`.
    Issue { domain: String, webroot: PathBuf },
    /// Copy issued material into place and register the reload hook.
    InstallCert {
        domain: String,
        cert_file: PathBuf,
        key_file: PathBuf,
        fullchain_file: PathBuf,
        reload_cmd: String,
    },
    /// Revoke the certificate with the CA.
    Revoke { domain: String },
    /// Drop the domain from the client's renewal list.
    Remove { domain: String },
}

impl AcmeCommand {
    /// Step label used in logs and errors.
    pub fn step(&self) -> &'static str {
        match self {
            AcmeCommand::Issue { .. } => "certificate issuance",
            AcmeCommand::InstallCert { .. } => "certificate installation",
            AcmeCommand::Revoke { .. } => "certificate revocation",
            AcmeCommand::Remove { .. } => "certificate removal",
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            AcmeCommand::Issue { domain, .. }
            | AcmeCommand::InstallCert { domain, .. }
            | AcmeCommand::Revoke { domain }
            | AcmeCommand::Remove { domain } => domain,
        }
    }

    /// Command-line arguments, starting with the `--<verb>` flag.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![format!("--{}", self.as_ref()).into()];
        args.push("-d".into());
        args.push(self.domain().into());

        match self {
            AcmeCommand::Issue { webroot, .. } => {
                args.push("-w".into());
                args.push(webroot.into());
            }
            AcmeCommand::InstallCert {
                cert_file,
                key_file,
                fullchain_file,
                reload_cmd,
                ..
            } => {
                args.push("--cert-file".into());
                args.push(cert_file.into());
                args.push("--key-file".into());
                args.push(key_file.into());
                args.push("--fullchain-file".into());
                args.push(fullchain_file.into());
                args.push("--reloadCmd".into());
                args.push(reload_cmd.into());
            }
            AcmeCommand::Revoke { .. } | AcmeCommand::Remove { .. } => {}
        }

        args
    }
}

/// Runs the ACME client with inherited stdout/stderr.
///
/// The exit status is the only signal consumed; there is no timeout, so a hung
/// client blocks the caller.
#[derive(Debug, Clone)]
pub struct AcmeClient {
    program: PathBuf,
}

impl AcmeClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs `command` and waits for it to exit.
    pub fn run(&self, command: &AcmeCommand) -> Result<(), ManageError> {
        let step = command.step();
        info!("Running {step} for '{}'", command.domain());

        let mut cmd = Command::new(&self.program);
        cmd.args(command.args()).stdin(Stdio::null());
        debug!("Executing command: {cmd:?}");

        let status = cmd.status().map_err(|source| ManageError::SubprocessLaunch {
            step,
            program: self.program.display().to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ManageError::SubprocessFailed {
                step,
                code: status.code(),
            })
        }
    }
}
