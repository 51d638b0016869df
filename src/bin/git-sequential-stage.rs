use std::env;
use std::process;

use clap::Parser;
use log::LevelFilter;

use git_sequential_stage::app::App;
use git_sequential_stage::cancel::{self, CancelToken};
use git_sequential_stage::cli::Cli;
use git_sequential_stage::error::{ErrorKind, TROUBLESHOOTING};
use git_sequential_stage::git::Git;

fn main() {
    let cli = Cli::parse();

    // quiet by default; GIT_SEQUENTIAL_STAGE_VERBOSE (any non-empty value)
    // turns on debug diagnostics on stderr
    let verbose = env::var("GIT_SEQUENTIAL_STAGE_VERBOSE")
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    env_logger::Builder::new()
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .format_target(false)
        .format_timestamp(None)
        .init();

    let token = CancelToken::new();
    cancel::register_ctrlc(&token);

    let app = App::new(Git::new().with_cancel_token(token));
    if let Err(err) = app.run(cli.command) {
        if err.kind() == ErrorKind::SafetyCheckFailed {
            // the payload is its own structured message, marker first
            eprintln!("{err}");
        } else {
            eprintln!("error: {err}");
            eprintln!();
            eprintln!("{TROUBLESHOOTING}");
        }
        process::exit(1);
    }
}
