//! ShardStore batch indexer binary
//!
//! Reads a `(key, size, offset)` stream (see the `fast` module docs for the
//! grammar), builds the static index, and answers the trailing queries on
//! stdout. The input must be a mappable regular file: pass a path, or
//! redirect one onto stdin (`shardstore-indexer < input.txt`).

use std::fs::File;
use std::io;
use std::mem::ManuallyDrop;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use shardstore::fast;

/// ShardStore batch indexer
#[derive(Parser, Debug)]
#[command(name = "shardstore-indexer")]
#[command(about = "One-shot static index over a (key, size, offset) stream")]
#[command(version)]
struct Args {
    /// Input file (defaults to stdin, which must be a regular file)
    input: Option<PathBuf>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();
    let stdout = io::stdout().lock();
    let started = std::time::Instant::now();

    let result = match args.input {
        Some(path) => File::open(&path)
            .map_err(shardstore::StoreError::from)
            .and_then(|file| fast::run(&file, stdout)),
        None => {
            // Borrow fd 0 as a File without taking ownership; ManuallyDrop
            // keeps stdin open when the handle goes out of scope.
            use std::os::fd::{AsRawFd, FromRawFd};
            let stdin = io::stdin();
            let file = ManuallyDrop::new(unsafe { File::from_raw_fd(stdin.as_raw_fd()) });
            fast::run(&file, stdout)
        }
    };

    match result {
        Ok(()) => {
            tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "pipeline complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
