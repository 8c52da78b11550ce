//! turnstile CLI entry point.
//!
//! A minimal entrypoint that parses arguments via `cli::run`, prints
//! errors to stderr, and exits non-zero on failure. All wiring lives in
//! the CLI module.

use turnstile::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
