// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

pub type Output = std::process::Output;

/// Constructors for [Output], used when scripting a fake executor.
pub trait OutputExt: Sized {
    /// An output which exited with status zero and printed nothing.
    fn success() -> Self;

    /// An output which exited normally with `code`.
    fn exited(code: i32) -> Self;

    /// An output which was terminated by `signal`.
    fn signaled(signal: i32) -> Self;

    fn set_stdout<S: AsRef<str>>(self, stdout: S) -> Self;
    fn set_stderr<S: AsRef<str>>(self, stderr: S) -> Self;
}

impl OutputExt for Output {
    fn success() -> Self {
        Self::exited(0)
    }

    fn exited(code: i32) -> Self {
        // Raw wait(2) status: the exit code lives in the second byte.
        Output {
            status: ExitStatus::from_raw((code & 0xff) << 8),
            stdout: vec![],
            stderr: vec![],
        }
    }

    fn signaled(signal: i32) -> Self {
        Output {
            status: ExitStatus::from_raw(signal & 0x7f),
            stdout: vec![],
            stderr: vec![],
        }
    }

    fn set_stdout<S: AsRef<str>>(mut self, stdout: S) -> Self {
        self.stdout = stdout.as_ref().as_bytes().to_vec();
        self
    }

    fn set_stderr<S: AsRef<str>>(mut self, stderr: S) -> Self {
        self.stderr = stderr.as_ref().as_bytes().to_vec();
        self
    }
}
