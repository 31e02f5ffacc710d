// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Library interfaces for `mark-resource-unusable`.
//!
//! The tool drains a storage resource hosted on this node: it raises the
//! resource's minimum free space for create to the total size of the
//! filesystem backing its vault, so the catalog stops placing new data there.

pub mod capacity;
pub mod cmd;
pub mod config;
pub mod drain;
pub mod fakes;
pub mod host;
pub mod iadmin;
pub mod vault;

#[cfg(test)]
mod test_util;

pub use config::Config;
pub use drain::{drain_resource, DrainError, DrainReport};
