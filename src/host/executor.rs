// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::error::{output_to_exec_error, ExecutionError};
use super::input::{envs_to_string, Input};
use super::output::{Output, OutputExt};

use slog::{debug, error, info, Logger};
use std::io::Read;
use std::process::{Command, Stdio};
use std::str::from_utf8;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub fn command_to_string(command: &Command) -> String {
    Input::from(command).to_string()
}

fn log_input(log: &Logger, id: u64, command: &Command) {
    let input = Input::from(command);
    info!(
        log,
        "running command via executor"; "id" => id, "command" => %input
    );
    debug!(
        log,
        "running command via executor";
        "id" => id,
        "envs" => envs_to_string(&input),
    );
}

fn log_output(log: &Logger, id: u64, output: &Output) {
    info!(
        log,
        "finished running command via executor";
        "id" => id,
        "result" => if output.status.success() { "OK" } else { "ERROR" },
        "status" => output
            .status
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string()),
    );
    if !output.stdout.is_empty() {
        debug!(
            log,
            "finished command stdout";
            "id" => id,
            "stdout" => from_utf8(&output.stdout)
                .unwrap_or("<Not valid UTF-8>"),
        );
    }
    if !output.stderr.is_empty() {
        debug!(
            log,
            "finished command stderr";
            "id" => id,
            "stderr" => from_utf8(&output.stderr)
                .unwrap_or("<Not valid UTF-8>"),
        );
    }
}

/// Describes the commonly-used "safe-to-reference" type describing the
/// Executor as a trait object.
pub type BoxedExecutor = Arc<dyn Executor>;

/// Describes an "executor", which can run [Command]s and return a response.
///
/// - In production, this is usually simply a [HostExecutor].
/// - Under test, this can be customized, and a [FakeExecutor] may be used.
pub trait Executor: Send + Sync {
    /// Executes a task, waiting for it to complete, and returning output.
    ///
    /// A command which runs but exits unsuccessfully is reported as
    /// [ExecutionError::CommandFailure].
    fn execute(&self, command: &mut Command) -> Result<Output, ExecutionError>;
}

/// Handler called when a fake command is run.
pub type WaitFn = dyn FnMut(Input) -> Output + Send + Sync;
pub type BoxedWaitFn = Box<WaitFn>;

struct FakeExecutorInner {
    log: Logger,
    counter: AtomicU64,
    wait_handler: Mutex<BoxedWaitFn>,
    history: Mutex<Vec<Input>>,
}

/// An executor which can expect certain inputs, and respond with specific
/// outputs.
pub struct FakeExecutor {
    inner: FakeExecutorInner,
}

impl FakeExecutor {
    pub fn new(log: Logger) -> Arc<FakeExecutor> {
        Arc::new(Self {
            inner: FakeExecutorInner {
                log,
                counter: AtomicU64::new(0),
                wait_handler: Mutex::new(Box::new(|_input| Output::success())),
                history: Mutex::new(vec![]),
            },
        })
    }

    /// Set the request handler to an arbitrary function.
    pub fn set_wait_handler(&self, f: BoxedWaitFn) {
        *self.inner.wait_handler.lock().unwrap() = f;
    }

    /// Perform some type coercion to access a commonly-used trait object.
    pub fn as_executor(self: Arc<Self>) -> BoxedExecutor {
        self
    }

    /// Every command this executor has been asked to run, in order.
    pub fn history(&self) -> Vec<Input> {
        self.inner.history.lock().unwrap().clone()
    }
}

impl Executor for FakeExecutor {
    fn execute(&self, command: &mut Command) -> Result<Output, ExecutionError> {
        let id = self.inner.counter.fetch_add(1, Ordering::SeqCst);
        log_input(&self.inner.log, id, command);

        let input = Input::from(&*command);
        self.inner.history.lock().unwrap().push(input.clone());
        let output = self.inner.wait_handler.lock().unwrap()(input);
        log_output(&self.inner.log, id, &output);

        if !output.status.success() {
            return Err(output_to_exec_error(
                command_to_string(command),
                &output,
            ));
        }
        Ok(output)
    }
}

pub struct HostExecutor {
    log: Logger,
    counter: AtomicU64,
}

impl HostExecutor {
    pub fn new(log: Logger) -> Arc<Self> {
        Arc::new(Self { log, counter: AtomicU64::new(0) })
    }

    pub fn as_executor(self: Arc<Self>) -> BoxedExecutor {
        self
    }
}

impl Executor for HostExecutor {
    /// Runs `command` with stdout and stderr sharing one pipe, so the
    /// returned `stdout` holds both streams in the order they were written
    /// and `stderr` is always empty.
    fn execute(&self, command: &mut Command) -> Result<Output, ExecutionError> {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        log_input(&self.log, id, command);

        let start_error = |command: &Command, err: std::io::Error| {
            error!(self.log, "Could not start program!"; "id" => id);
            ExecutionError::ExecutionStart {
                command: command_to_string(command),
                err,
            }
        };

        let (mut reader, writer) =
            os_pipe::pipe().map_err(|err| start_error(&*command, err))?;
        let writer_clone =
            writer.try_clone().map_err(|err| start_error(&*command, err))?;
        command.stdin(Stdio::null()).stdout(writer).stderr(writer_clone);
        let spawned = command.spawn();
        // The command holds our copies of the write end until they are
        // replaced; the read below only sees EOF once they are closed.
        command.stdout(Stdio::null()).stderr(Stdio::null());
        let mut child = spawned.map_err(|err| start_error(&*command, err))?;

        let mut combined = Vec::new();
        let read = reader.read_to_end(&mut combined);
        let status = child.wait();
        let status = read.and(status).map_err(|err| {
            error!(self.log, "Could not wait for program!"; "id" => id);
            ExecutionError::ExecutionWait {
                command: command_to_string(command),
                err,
            }
        })?;

        let output = Output { status, stdout: combined, stderr: Vec::new() };
        log_output(&self.log, id, &output);

        if !output.status.success() {
            return Err(output_to_exec_error(
                command_to_string(command),
                &output,
            ));
        }
        Ok(output)
    }
}

struct HandledCommand {
    input: Input,
    output: Output,
}

/// A handler that may be used for setting inputs/outputs to the executor
/// when these commands are known ahead-of-time.
///
/// See: [Self::register] for integration with a [FakeExecutor].
pub struct StaticHandler {
    expected: Vec<HandledCommand>,
    index: usize,
}

impl StaticHandler {
    pub fn new() -> Self {
        Self { expected: Vec::new(), index: 0 }
    }

    /// Convenience function to register the handler with a [FakeExecutor].
    pub fn register(mut self, executor: &FakeExecutor) {
        executor.set_wait_handler(Box::new(move |input| -> Output {
            self.execute(input)
        }));
    }

    /// Expects a static "input" to exactly produce some "output".
    pub fn expect(&mut self, input: Input, output: Output) {
        self.expected.push(HandledCommand { input, output });
    }

    /// A helper for [Self::expect] which quietly succeeds.
    pub fn expect_ok<S: AsRef<str>>(&mut self, input: S) {
        self.expect(Input::shell(input), Output::success())
    }

    fn execute(&mut self, observed_input: Input) -> Output {
        let expected = self
            .expected
            .get(self.index)
            .unwrap_or_else(|| panic!("Unexpected command: {observed_input}"));
        self.index += 1;

        assert_eq!(observed_input, expected.input, "Unexpected input command");
        expected.output.clone()
    }
}

impl Default for StaticHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StaticHandler {
    fn drop(&mut self) {
        let expected = self.expected.len();
        let actual = self.index;
        if actual < expected {
            let tip = &self.expected[actual].input;
            let errmsg = format!(
                "Only saw {actual} calls, expected {expected}\n\
                 Next would have been: {tip}"
            );
            if !std::thread::panicking() {
                panic!("{errmsg}");
            } else {
                eprintln!("{errmsg}");
            }
        }
    }
}
