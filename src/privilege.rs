//! Ownership and permission helpers for certificate material.
use std::{
    fs::{self, DirBuilder},
    os::unix::fs::{DirBuilderExt, PermissionsExt},
    path::Path,
};

use nix::unistd::{Gid, Uid, User, chown};
use tracing::debug;

use crate::error::ManageError;

/// Resolved system account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUser {
    pub name: String,
    pub uid: Uid,
    pub gid: Gid,
}

/// Looks up a system user by name.
pub fn lookup_user(name: &str) -> Result<ServiceUser, ManageError> {
    let user = User::from_name(name)
        .map_err(|err| ManageError::UserLookupFailed {
            user: name.to_string(),
            reason: err.to_string(),
        })?
        .ok_or_else(|| ManageError::UserLookupFailed {
            user: name.to_string(),
            reason: "no such user".to_string(),
        })?;

    Ok(ServiceUser {
        name: user.name,
        uid: user.uid,
        gid: user.gid,
    })
}

/// Creates `path` with `mode`, then hands it to `owner`. Missing parents are
/// created with default permissions.
///
/// The mode is reapplied after creation, so neither the umask nor a
/// pre-existing directory changes the result.
pub fn ensure_owned_dir(
    path: &Path,
    mode: u32,
    owner: &ServiceUser,
) -> Result<(), ManageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| ManageError::io("Could not create directory", parent, err))?;
    }

    match DirBuilder::new().mode(mode).create(path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => {}
        Err(err) => return Err(ManageError::io("Could not create directory", path, err)),
    }

    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|err| ManageError::io("Could not set directory permissions", path, err))?;

    chown(path, Some(owner.uid), Some(owner.gid)).map_err(|errno| {
        ManageError::io(
            "Could not change directory owner",
            path,
            std::io::Error::from(errno),
        )
    })?;

    debug!(
        "Prepared {} with mode {mode:o} for user '{}'",
        path.display(),
        owner.name
    );
    Ok(())
}
