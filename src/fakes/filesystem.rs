// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::host::FilesystemStats;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// A fake implementation of [crate::host::Filesystem].
///
/// Directories are registered up front together with the statistics of the
/// filesystem backing them. Paths which were never registered are neither
/// directories nor statable.
pub struct Filesystem {
    dirs: Mutex<BTreeMap<Utf8PathBuf, std::io::Result<FilesystemStats>>>,
}

impl Filesystem {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { dirs: Mutex::new(BTreeMap::new()) })
    }

    /// Registers `path` as a directory on a filesystem described by `stats`.
    pub fn add_dir<P: AsRef<Utf8Path>>(&self, path: P, stats: FilesystemStats) {
        self.dirs
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), Ok(stats));
    }

    /// Registers `path` as a directory whose statistics query fails with
    /// `kind`.
    pub fn add_unstatable_dir<P: AsRef<Utf8Path>>(
        &self,
        path: P,
        kind: std::io::ErrorKind,
    ) {
        self.dirs
            .lock()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), Err(kind.into()));
    }
}

impl crate::host::Filesystem for Filesystem {
    fn is_dir(&self, path: &Utf8Path) -> bool {
        self.dirs.lock().unwrap().contains_key(path)
    }

    fn statvfs(&self, path: &Utf8Path) -> std::io::Result<FilesystemStats> {
        match self.dirs.lock().unwrap().get(path) {
            Some(Ok(stats)) => Ok(*stats),
            Some(Err(err)) => Err(err.kind().into()),
            None => Err(std::io::ErrorKind::NotFound.into()),
        }
    }
}
