// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Facilities for the command-line entry point

use std::path::Path;
use std::process::exit;

/// Represents a fatal error in a command-line program
///
/// Usage errors never get this far: `clap` reports them and exits with
/// status 2 itself.
#[derive(Debug)]
pub enum CmdError {
    /// any failure reported with exit code 1
    Failure(anyhow::Error),
    /// an error whose exit code is dictated by something else, such as a
    /// child process
    Exit { code: i32, err: anyhow::Error },
}

impl CmdError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CmdError::Failure(_) => 1,
            CmdError::Exit { code, .. } => *code,
        }
    }
}

impl std::fmt::Display for CmdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmdError::Failure(err) | CmdError::Exit { err, .. } => {
                write!(f, "{err}")
            }
        }
    }
}

/// Exits the current process on a fatal error.
pub fn fatal(cmd_error: CmdError) -> ! {
    let arg0_passed = std::env::args().next().unwrap_or_default();
    let arg0 = Path::new(&arg0_passed)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("mark-resource-unusable");
    eprintln!("{}: {}", arg0, cmd_error);
    exit(cmd_error.exit_code());
}
