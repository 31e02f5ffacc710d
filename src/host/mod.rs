// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interfaces to the host: running commands and inspecting filesystems.
//!
//! Everything that touches the host OS goes through a trait object defined
//! here. Test doubles live in [crate::fakes] and in [FakeExecutor].

mod error;
mod executor;
mod filesystem;
mod input;
mod output;

pub use error::{output_to_exec_error, CommandFailureInfo, ExecutionError};
pub use executor::{
    command_to_string, BoxedExecutor, BoxedWaitFn, Executor, FakeExecutor,
    HostExecutor, StaticHandler, WaitFn,
};
pub use filesystem::{
    BoxedFilesystem, Filesystem, FilesystemStats, HostFilesystem,
};
pub use input::Input;
pub use output::{Output, OutputExt};
