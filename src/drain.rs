// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Draining a resource: vault lookup, capacity probe, context update.
//!
//! Raising a resource's minimum free space for create to the full size of its
//! filesystem means no placement decision can ever choose it for new data,
//! while existing data stays readable. Each step runs once, in order, and the
//! first failure ends the sequence.

use crate::capacity::{probe_capacity, StatError};
use crate::host::Filesystem;
use crate::iadmin::{Iadmin, SetContextError};
use crate::vault::{resolve_mount_path, ResolveError};
use camino::Utf8PathBuf;
use slog::{info, Logger};

/// Result of a completed drain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrainReport {
    pub resource: String,
    pub mount_path: Utf8PathBuf,
    pub capacity_bytes: u64,
}

#[derive(thiserror::Error, Debug)]
pub enum DrainError {
    #[error(transparent)]
    PathNotLocalOrMissing(#[from] ResolveError),

    #[error(transparent)]
    Stat(#[from] StatError),

    #[error(transparent)]
    SetContext(#[from] SetContextError),
}

impl DrainError {
    /// The exit code a process reporting this error should use.
    ///
    /// Failures of the administrative command pass its exit code through so
    /// callers can tell catalog-level failures apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            DrainError::SetContext(SetContextError::CommandFailed {
                code: Some(code),
                ..
            }) if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// Hook invoked once the capacity is known, before the catalog is modified.
pub trait Progress {
    fn applying(&mut self, resource: &str, bytes: u64);
}

impl<F: FnMut(&str, u64)> Progress for F {
    fn applying(&mut self, resource: &str, bytes: u64) {
        self(resource, bytes)
    }
}

/// Marks `resource` unusable for new data.
pub fn drain_resource(
    log: &Logger,
    fs: &dyn Filesystem,
    iadmin: &Iadmin,
    resource: &str,
    progress: &mut dyn Progress,
) -> Result<DrainReport, DrainError> {
    let log = log.new(slog::o!("resource" => resource.to_string()));

    let mount_path = resolve_mount_path(fs, resource)?;
    info!(log, "found local vault"; "path" => %mount_path);

    let capacity_bytes = probe_capacity(&log, fs, &mount_path)?;
    info!(log, "measured vault filesystem"; "capacity_bytes" => capacity_bytes);

    progress.applying(resource, capacity_bytes);
    iadmin.set_min_free_space_for_create(resource, capacity_bytes)?;

    Ok(DrainReport {
        resource: resource.to_string(),
        mount_path,
        capacity_bytes,
    })
}
