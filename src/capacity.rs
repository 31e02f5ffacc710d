// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Measuring the total capacity of a vault's filesystem.

use crate::host::Filesystem;
use camino::{Utf8Path, Utf8PathBuf};
use slog::{debug, Logger};

/// Error returned by [probe_capacity].
#[derive(thiserror::Error, Debug)]
#[error("Failed to query filesystem statistics for {path}: {err}")]
pub struct StatError {
    pub path: Utf8PathBuf,
    #[source]
    pub err: std::io::Error,
}

/// Returns the total size in bytes of the filesystem backing `path`.
///
/// This is the filesystem's full capacity, regardless of how much of it is
/// currently in use.
pub fn probe_capacity(
    log: &Logger,
    fs: &dyn Filesystem,
    path: &Utf8Path,
) -> Result<u64, StatError> {
    let stats = fs
        .statvfs(path)
        .map_err(|err| StatError { path: path.to_path_buf(), err })?;
    debug!(
        log,
        "read filesystem statistics";
        "path" => %path,
        "fragment_size" => stats.fragment_size,
        "total_blocks" => stats.total_blocks,
        "free_blocks" => stats.free_blocks,
    );

    stats.fragment_size.checked_mul(stats.total_blocks).ok_or_else(|| {
        StatError {
            path: path.to_path_buf(),
            err: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "capacity overflows u64: {} blocks of {} bytes",
                    stats.total_blocks, stats.fragment_size
                ),
            ),
        }
    })
}
