//! riverwatch -- a match replay viewer for river-claiming games.
//!
//! This binary reads commands from stdin and writes notifications to stdout.
//! Logs go to stderr and are filtered through `RUST_LOG` (default `info`).

use std::io::{self, BufRead};

use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use riverwatch::driver::Driver;
use riverwatch::protocol::parser::parse_command;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
}

/// Runs the command loop until `quit` or end of input.
fn main() {
    init_logging();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut driver = Driver::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let cmd = match parse_command(&line) {
            Some(c) => c,
            None => continue,
        };

        match driver.handle(cmd, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!("failed to write output: {}", e);
                break;
            }
        }
    }
}
