// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tests for the `mark-resource-unusable` executable.
//!
//! The administrative command is replaced by a shell script which records
//! its arguments and exits with a scripted status.

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use resc_drain::host::{Filesystem, HostFilesystem};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use subprocess::Exec;
use subprocess::ExitStatus;
use subprocess::NullFile;
use subprocess::Redirection;

/// name of the "mark-resource-unusable" executable
const CMD_MARK_RESOURCE_UNUSABLE: &str =
    env!("CARGO_BIN_EXE_mark-resource-unusable");

/// maximum time to wait for any command
///
/// The tool blocks on the administrative command, so a broken fake could
/// otherwise hang the test suite.
const TIMEOUT: Duration = Duration::from_millis(10000);

/// A resource name whose vault certainly does not exist on the test host.
const NONLOCAL_RESOURCE: &str = "resc-drain-test-nonexistent-vault";

// Standard exit codes
const EXIT_SUCCESS: u32 = libc::EXIT_SUCCESS as u32;
const EXIT_FAILURE: u32 = libc::EXIT_FAILURE as u32;
const EXIT_USAGE: u32 = 2;

fn base_command() -> Exec {
    Exec::cmd(CMD_MARK_RESOURCE_UNUSABLE)
        .env_remove("RESC_DRAIN_IADMIN")
        .env_remove("RESC_DRAIN_LOG")
}

/// Run the given command to completion or up to a hardcoded timeout, whichever
/// is shorter.  Stdin will be empty, and both stdout and stderr will be
/// buffered to disk and returned as strings.
fn run_command(exec: Exec) -> (ExitStatus, String, String) {
    let cmdline = exec.to_cmdline_lossy();
    let dir = Utf8TempDir::new().expect("failed to create temporary directory");
    let stdout_path = dir.path().join("stdout");
    let stderr_path = dir.path().join("stderr");
    let stdout_file =
        fs::File::create(&stdout_path).expect("failed to create stdout file");
    let stderr_file =
        fs::File::create(&stderr_path).expect("failed to create stderr file");

    let mut subproc = exec
        .stdin(NullFile)
        .stdout(Redirection::File(stdout_file))
        .stderr(Redirection::File(stderr_file))
        .detached()
        .popen()
        .unwrap_or_else(|err| {
            panic!("failed to start command {cmdline}: {err}")
        });

    let exit_status = subproc
        .wait_timeout(TIMEOUT)
        .unwrap_or_else(|err| {
            panic!("failed to wait for command {cmdline}: {err}")
        })
        .unwrap_or_else(|| {
            panic!(
                "timed out waiting for command for {} ms: {}",
                TIMEOUT.as_millis(),
                cmdline
            )
        });

    let stdout_text =
        fs::read_to_string(&stdout_path).expect("failed to read stdout file");
    let stderr_text =
        fs::read_to_string(&stderr_path).expect("failed to read stderr file");

    (exit_status, stdout_text, stderr_text)
}

fn assert_exit_code(exit_status: ExitStatus, code: u32, stderr_text: &str) {
    if let ExitStatus::Exited(exit_code) = exit_status {
        assert_eq!(exit_code, code, "stderr:\n{stderr_text}");
    } else {
        panic!(
            "expected normal process exit with code {}, got {:?}\nstderr:\n{}",
            code, exit_status, stderr_text
        );
    }
}

/// A stand-in for the administrative command.
struct FakeIadmin {
    dir: Utf8TempDir,
}

impl FakeIadmin {
    /// Creates a script which logs its arguments, prints `output`, and exits
    /// with `code`.
    fn new(output: &str, code: i32) -> Self {
        Self::with_body(&format!("printf '%s' '{output}'\nexit {code}"))
    }

    /// Creates a script which logs its arguments and then runs `body`.
    fn with_body(body: &str) -> Self {
        let dir =
            Utf8TempDir::new().expect("failed to create temporary directory");
        let fake = FakeIadmin { dir };
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\n{}\n",
            fake.invocations_path(),
            body
        );
        fs::write(fake.path(), script).expect("failed to write fake iadmin");
        fs::set_permissions(fake.path(), fs::Permissions::from_mode(0o755))
            .expect("failed to make fake iadmin executable");
        fake
    }

    fn path(&self) -> Utf8PathBuf {
        self.dir.path().join("iadmin")
    }

    fn invocations_path(&self) -> Utf8PathBuf {
        self.dir.path().join("invocations")
    }

    /// Every argument list the script was run with.
    fn invocations(&self) -> Vec<String> {
        match fs::read_to_string(self.invocations_path()) {
            Ok(contents) => contents.lines().map(String::from).collect(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => vec![],
            Err(err) => panic!("failed to read invocations: {err}"),
        }
    }
}

fn capacity_of(path: &str) -> u64 {
    let stats = HostFilesystem::new()
        .statvfs(Utf8Path::new(path))
        .expect("statvfs of test vault");
    stats.fragment_size * stats.total_blocks
}

#[test]
fn test_no_args() {
    let (exit_status, stdout_text, stderr_text) = run_command(base_command());
    assert_exit_code(exit_status, EXIT_USAGE, &stderr_text);
    assert_eq!(stdout_text, "");
    assert!(stderr_text.contains("<RESOURCE>"), "stderr:\n{stderr_text}");
}

#[test]
fn test_extra_args() {
    let fake = FakeIadmin::new("", 0);
    let exec = base_command()
        .arg("--iadmin")
        .arg(fake.path())
        .arg("tmp")
        .arg("another");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_USAGE, &stderr_text);
    assert!(fake.invocations().is_empty());
}

#[test]
fn test_empty_resource_name() {
    let fake = FakeIadmin::new("", 0);
    let exec = base_command().arg("--iadmin").arg(fake.path()).arg("");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_USAGE, &stderr_text);
    assert!(fake.invocations().is_empty());
}

#[test]
fn test_nonlocal_resource() {
    let fake = FakeIadmin::new("", 0);
    let exec =
        base_command().arg("--iadmin").arg(fake.path()).arg(NONLOCAL_RESOURCE);
    let (exit_status, stdout_text, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_FAILURE, &stderr_text);
    assert_eq!(stdout_text, "");
    assert!(
        stderr_text.contains(&format!(
            "isdir check failed for vault /{NONLOCAL_RESOURCE} of resource \
             {NONLOCAL_RESOURCE}"
        )),
        "stderr:\n{stderr_text}"
    );
    assert!(fake.invocations().is_empty());
}

#[test]
fn test_file_is_not_a_vault() {
    let fake = FakeIadmin::new("", 0);
    let exec = base_command().arg("--iadmin").arg(fake.path()).arg("dev/null");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_FAILURE, &stderr_text);
    assert!(fake.invocations().is_empty());
}

#[test]
fn test_drain_success() {
    let fake = FakeIadmin::new("", 0);
    let capacity = capacity_of("/tmp");
    let exec = base_command().arg("--iadmin").arg(fake.path()).arg("tmp");
    let (exit_status, stdout_text, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_SUCCESS, &stderr_text);
    assert!(
        stdout_text.starts_with(&format!(
            "setting minimum free space for resource tmp to {capacity} \
             bytes...\n"
        )),
        "stdout:\n{stdout_text}"
    );
    assert_eq!(
        fake.invocations(),
        vec![format!(
            "modresc tmp context \
             minimum_free_space_for_create_in_bytes={capacity}"
        )]
    );
}

#[test]
fn test_iadmin_failure_exit_code() {
    let fake = FakeIadmin::new("resource not found", 3);
    let exec = base_command().arg("--iadmin").arg(fake.path()).arg("tmp");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, 3, &stderr_text);
    assert!(
        stderr_text.contains("resource not found"),
        "stderr:\n{stderr_text}"
    );
    // Run once, never retried.
    assert_eq!(fake.invocations().len(), 1);
}

#[test]
fn test_iadmin_output_reported_in_write_order() {
    let fake = FakeIadmin::with_body(
        "echo first-stdout\n\
         echo second-stderr 1>&2\n\
         echo third-stdout\n\
         exit 4",
    );
    let exec = base_command().arg("--iadmin").arg(fake.path()).arg("tmp");
    let (exit_status, stdout_text, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, 4, &stderr_text);
    assert!(
        stderr_text.contains("first-stdout\nsecond-stderr\nthird-stdout\n"),
        "stderr:\n{stderr_text}"
    );
    // The administrative command's output goes only into the failure message.
    assert!(!stdout_text.contains("second-stderr"), "stdout:\n{stdout_text}");
    // The default log filter keeps stderr down to the failure message.
    assert!(
        !stderr_text.contains("administrative command failed"),
        "stderr:\n{stderr_text}"
    );
    assert_eq!(fake.invocations().len(), 1);
}

#[test]
fn test_iadmin_killed_by_signal() {
    let fake = FakeIadmin::with_body("kill -TERM $$");
    let exec = base_command().arg("--iadmin").arg(fake.path()).arg("tmp");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_FAILURE, &stderr_text);
    assert!(
        stderr_text.contains("(status: killed)"),
        "stderr:\n{stderr_text}"
    );
    assert_eq!(fake.invocations().len(), 1);
}

#[test]
fn test_iadmin_missing() {
    let dir = Utf8TempDir::new().unwrap();
    let exec = base_command()
        .arg("--iadmin")
        .arg(dir.path().join("no-such-iadmin"))
        .arg("tmp");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_FAILURE, &stderr_text);
    assert!(
        stderr_text.contains("Could not run administrative command"),
        "stderr:\n{stderr_text}"
    );
}

#[test]
fn test_iadmin_from_config_and_env() {
    let from_config = FakeIadmin::new("", 0);
    let config_dir = Utf8TempDir::new().unwrap();
    let config_path = config_dir.path().join("config.toml");
    fs::write(&config_path, format!("iadmin = \"{}\"\n", from_config.path()))
        .expect("failed to write config file");

    let exec = base_command().arg("--config").arg(&config_path).arg("tmp");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_SUCCESS, &stderr_text);
    assert_eq!(from_config.invocations().len(), 1);

    // The environment takes precedence over the configuration file.
    let from_env = FakeIadmin::new("", 0);
    let exec = base_command()
        .env("RESC_DRAIN_IADMIN", from_env.path().as_str())
        .arg("--config")
        .arg(&config_path)
        .arg("tmp");
    let (exit_status, _, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_SUCCESS, &stderr_text);
    assert_eq!(from_env.invocations().len(), 1);
    assert_eq!(from_config.invocations().len(), 1);
}

#[test]
fn test_bad_config() {
    let config_dir = Utf8TempDir::new().unwrap();
    let config_path = config_dir.path().join("config.toml");
    fs::write(&config_path, "iadmin = 7\n").expect("failed to write config");

    let exec = base_command().arg("--config").arg(&config_path).arg("tmp");
    let (exit_status, stdout_text, stderr_text) = run_command(exec);
    assert_exit_code(exit_status, EXIT_FAILURE, &stderr_text);
    assert_eq!(stdout_text, "");
    assert!(
        stderr_text.contains(&format!("error parsing \"{config_path}\"")),
        "stderr:\n{stderr_text}"
    );
}
