// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wrapper around the catalog's administrative command.

use crate::host::{BoxedExecutor, ExecutionError};
use camino::{Utf8Path, Utf8PathBuf};
use slog::{info, Logger};
use std::process::Command;

/// Default location of the administrative command.
pub const IADMIN: &str = "/usr/bin/iadmin";

/// Resource context key holding the minimum free space required before the
/// catalog places new data on a resource.
pub const MIN_FREE_SPACE_FOR_CREATE: &str =
    "minimum_free_space_for_create_in_bytes";

/// Error returned by [Iadmin::set_min_free_space_for_create].
#[derive(thiserror::Error, Debug)]
pub enum SetContextError {
    #[error(
        "Could not run administrative command for resource {resource}: {err}"
    )]
    Start {
        resource: String,
        #[source]
        err: ExecutionError,
    },

    #[error(
        "Failed to set minimum_free_space_for_create_in_bytes on resource \
         {resource} (status: {}). Output:\n{output}",
        status_to_string(.code)
    )]
    CommandFailed {
        resource: String,
        /// Exit code of the administrative command, or `None` if it was
        /// terminated by a signal.
        code: Option<i32>,
        /// Combined stdout and stderr of the administrative command.
        output: String,
    },
}

fn status_to_string(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "killed".to_string())
}

/// Issues resource modifications through the administrative command.
pub struct Iadmin {
    log: Logger,
    binary: Utf8PathBuf,
    executor: BoxedExecutor,
}

impl Iadmin {
    pub fn new(
        log: &Logger,
        binary: impl AsRef<Utf8Path>,
        executor: BoxedExecutor,
    ) -> Self {
        let binary = binary.as_ref().to_path_buf();
        Self {
            log: log.new(slog::o!("iadmin" => binary.to_string())),
            binary,
            executor,
        }
    }

    pub fn binary(&self) -> &Utf8Path {
        &self.binary
    }

    /// Sets the resource context entry which stops the catalog from placing
    /// new data on `resource` unless at least `bytes` are free.
    ///
    /// The command is run exactly once.
    pub fn set_min_free_space_for_create(
        &self,
        resource: &str,
        bytes: u64,
    ) -> Result<(), SetContextError> {
        let mut command = Command::new(&self.binary);
        let cmd = command.args([
            "modresc",
            resource,
            "context",
            &format!("{MIN_FREE_SPACE_FOR_CREATE}={bytes}"),
        ]);

        match self.executor.execute(cmd) {
            Ok(_) => {
                info!(
                    self.log,
                    "set resource context";
                    "resource" => resource,
                    "bytes" => bytes,
                );
                Ok(())
            }
            Err(ExecutionError::CommandFailure(info)) => {
                info!(
                    self.log,
                    "administrative command failed";
                    "resource" => resource,
                    "status" => %info.status,
                );
                Err(SetContextError::CommandFailed {
                    resource: resource.to_string(),
                    code: info.code(),
                    output: info.combined_output(),
                })
            }
            Err(err) => Err(SetContextError::Start {
                resource: resource.to_string(),
                err,
            }),
        }
    }
}
