//! Restarting services through the process supervisor's control command.
use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tracing::{debug, error, info};

use crate::constants::SUPERVISOR_RESTART_VERB;
use crate::error::ManageError;

const RESTART_STEP: &str = "service restart";

/// Outcome of a best-effort batch restart.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestartReport {
    /// Services whose restart request was accepted, in request order.
    pub succeeded: Vec<String>,
    /// Services whose restart failed to launch or exited non-zero.
    pub failed: Vec<String>,
}

impl RestartReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Issues `<supervisor_ctl> restart <service>` requests.
#[derive(Debug, Clone)]
pub struct ServiceRestarter {
    program: PathBuf,
}

impl ServiceRestarter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Restarts one service and waits for the control command to exit.
    pub fn restart(&self, service: &str) -> Result<(), ManageError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(SUPERVISOR_RESTART_VERB)
            .arg(service)
            .stdin(Stdio::null());
        debug!("Executing command: {cmd:?}");

        let status = cmd.status().map_err(|source| ManageError::SubprocessLaunch {
            step: RESTART_STEP,
            program: self.program.display().to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(ManageError::SubprocessFailed {
                step: RESTART_STEP,
                code: status.code(),
            })
        }
    }

    /// Restarts every service in order. A failure is logged and the batch
    /// moves on to the next service.
    pub fn restart_many<S: AsRef<str>>(&self, services: &[S]) -> RestartReport {
        let mut report = RestartReport::default();
        for service in services {
            let service = service.as_ref();
            match self.restart(service) {
                Ok(()) => {
                    info!("Restart requested for '{service}'");
                    report.succeeded.push(service.to_string());
                }
                Err(err) => {
                    error!("Failed to restart '{service}': {err}");
                    report.failed.push(service.to_string());
                }
            }
        }
        report
    }
}
