#![forbid(unsafe_code)]

//! sqh — Syslog Query Helper CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    let verbose = args.verbose();
    if let Err(e) = cli_app::run(&args) {
        if verbose {
            eprintln!("sqh: {e}");
        } else {
            eprintln!("sqh: {}", e.public_message());
        }
        std::process::exit(1);
    }
}
