//! Entry point for the `convoy` binary.
#![forbid(unsafe_code)]

use std::fmt::Display;

use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();
    if let Err(err) = convoy_cli::run() {
        report(&err);
        std::process::exit(1);
    }
}

/// Route `log` records to stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        report(&err);
    }
}

#[expect(clippy::print_stderr, reason = "the binary reports failures on stderr")]
fn report(err: &dyn Display) {
    eprintln!("convoy: {err}");
}
