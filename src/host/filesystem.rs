// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use camino::Utf8Path;
use std::sync::Arc;

/// The subset of `statvfs(2)` the drain sequence consumes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilesystemStats {
    /// Fundamental block size (`f_frsize`).
    pub fragment_size: u64,
    /// Size of the filesystem in `fragment_size` units (`f_blocks`).
    pub total_blocks: u64,
    /// Free blocks (`f_bfree`). Logged, never used for the threshold.
    pub free_blocks: u64,
}

pub type BoxedFilesystem = Arc<dyn Filesystem>;

/// Read-only view of the host's filesystems.
pub trait Filesystem: Send + Sync {
    /// Returns true if `path` names a directory, following symlinks.
    fn is_dir(&self, path: &Utf8Path) -> bool;

    /// Returns statistics for the filesystem containing `path`.
    fn statvfs(&self, path: &Utf8Path) -> std::io::Result<FilesystemStats>;
}

/// The real host filesystem.
pub struct HostFilesystem {}

impl HostFilesystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {})
    }

    pub fn as_filesystem(self: Arc<Self>) -> BoxedFilesystem {
        self
    }
}

impl Filesystem for HostFilesystem {
    fn is_dir(&self, path: &Utf8Path) -> bool {
        path.is_dir()
    }

    fn statvfs(&self, path: &Utf8Path) -> std::io::Result<FilesystemStats> {
        let stat = rustix::fs::statvfs(path.as_std_path())?;
        Ok(FilesystemStats {
            fragment_size: stat.f_frsize,
            total_blocks: stat.f_blocks,
            free_blocks: stat.f_bfree,
        })
    }
}
