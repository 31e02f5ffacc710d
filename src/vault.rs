// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Locating the local vault of a storage resource.
//!
//! Resources are mounted at a top-level directory named after the resource.
//! That is a deployment convention, not something the catalog records, so the
//! only check made here is that the directory exists on this node.

use crate::host::Filesystem;
use camino::Utf8PathBuf;

/// Error returned by [resolve_mount_path].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("isdir check failed for vault {path} of resource {resource}")]
pub struct ResolveError {
    pub resource: String,
    pub path: Utf8PathBuf,
}

/// Returns the expected vault path of `resource`.
pub fn mount_path(resource: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("/{resource}"))
}

/// Returns the vault path of `resource`, provided it is a directory on this
/// node.
pub fn resolve_mount_path(
    fs: &dyn Filesystem,
    resource: &str,
) -> Result<Utf8PathBuf, ResolveError> {
    let path = mount_path(resource);
    if !fs.is_dir(&path) {
        return Err(ResolveError { resource: resource.to_string(), path });
    }
    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fakes;
    use crate::host::{FilesystemStats, HostFilesystem};

    const STATS: FilesystemStats = FilesystemStats {
        fragment_size: 4096,
        total_blocks: 1024,
        free_blocks: 1024,
    };

    #[test]
    fn mount_path_is_slash_prefixed_name() {
        for name in
            ["iresc01", "a", "scratch-114", "nested/child", "with space"]
        {
            assert_eq!(mount_path(name).as_str(), format!("/{name}"));
        }
    }

    #[test]
    fn resolve_accepts_registered_directory() {
        let fs = fakes::filesystem::Filesystem::new();
        fs.add_dir("/iresc01", STATS);

        let path = resolve_mount_path(&*fs, "iresc01").unwrap();
        assert_eq!(path, "/iresc01");
    }

    #[test]
    fn resolve_rejects_missing_directory() {
        let fs = fakes::filesystem::Filesystem::new();
        fs.add_dir("/iresc01", STATS);

        let err = resolve_mount_path(&*fs, "iresc02").unwrap_err();
        assert_eq!(
            err,
            ResolveError {
                resource: "iresc02".to_string(),
                path: Utf8PathBuf::from("/iresc02"),
            }
        );
        assert_eq!(
            err.to_string(),
            "isdir check failed for vault /iresc02 of resource iresc02"
        );
    }

    #[test]
    fn resolve_on_host() {
        let fs = HostFilesystem::new();
        assert_eq!(resolve_mount_path(&*fs, "tmp").unwrap(), "/tmp");
        // A device node exists but is not a directory.
        resolve_mount_path(&*fs, "dev/null").unwrap_err();
        resolve_mount_path(&*fs, "nonexistent-resc-drain-vault").unwrap_err();
    }
}
