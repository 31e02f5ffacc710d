// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Marks a locally-hosted storage resource as unusable for new data by
//! setting its minimum free space for create to the size of its filesystem.

use anyhow::anyhow;
use camino::Utf8PathBuf;
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use resc_drain::cmd::{fatal, CmdError};
use resc_drain::host::{HostExecutor, HostFilesystem};
use resc_drain::iadmin::Iadmin;
use resc_drain::{drain_resource, Config, DrainError};
use slog::{debug, Drain, Logger};

/// Environment variable holding an `env_logger`-style log filter.
const LOG_ENV: &str = "RESC_DRAIN_LOG";

#[derive(Debug, Parser)]
#[clap(
    name = "mark-resource-unusable",
    about = "Disable a locally-hosted resource for new data via its minimum \
             free space for create"
)]
struct Args {
    /// TOML configuration file
    #[clap(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// Path to the administrative command, overriding the configuration
    #[clap(long, value_name = "PATH", env = "RESC_DRAIN_IADMIN")]
    iadmin: Option<Utf8PathBuf>,

    /// partition/resource to disable via minimum free space
    #[clap(
        value_name = "RESOURCE",
        value_parser = NonEmptyStringValueParser::new()
    )]
    resource: String,
}

fn main() {
    let args = Args::parse();

    let (log, guard) = stderr_logger();
    let result = do_run(args, &log);
    // Flush queued log records before any exit.
    drop(log);
    drop(guard);

    if let Err(cmd_error) = result {
        fatal(cmd_error);
    }
}

fn do_run(args: Args, log: &Logger) -> Result<(), CmdError> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .map_err(|err| CmdError::Failure(anyhow!(err)))?,
        None => Config::default(),
    };
    if let Some(iadmin) = args.iadmin {
        config.iadmin = iadmin;
    }
    debug!(log, "loaded configuration"; "config" => ?config);

    let fs = HostFilesystem::new().as_filesystem();
    let executor = HostExecutor::new(log.clone()).as_executor();
    let iadmin = Iadmin::new(log, &config.iadmin, executor);

    let report = drain_resource(
        log,
        &*fs,
        &iadmin,
        &args.resource,
        &mut |resource: &str, bytes: u64| {
            println!(
                "setting minimum free space for resource {} to {} bytes...",
                resource, bytes
            );
        },
    )
    .map_err(drain_error_to_cmd_error)?;

    println!(
        "resource {} ({}) no longer accepts new data",
        report.resource, report.mount_path
    );
    Ok(())
}

fn drain_error_to_cmd_error(err: DrainError) -> CmdError {
    match err.exit_code() {
        1 => CmdError::Failure(anyhow!(err)),
        code => CmdError::Exit { code, err: anyhow!(err) },
    }
}

fn stderr_logger() -> (Logger, slog_async::AsyncGuard) {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let mut builder = slog_envlogger::LogBuilder::new(drain);
    if let Ok(s) = std::env::var(LOG_ENV) {
        builder = builder.parse(&s);
    } else {
        // Stay quiet unless something goes wrong; stdout carries progress.
        builder = builder.filter(None, slog::FilterLevel::Warning);
    }
    let (drain, guard) =
        slog_async::Async::new(builder.build().fuse()).build_with_guard();
    (Logger::root(drain.fuse(), slog::o!()), guard)
}
