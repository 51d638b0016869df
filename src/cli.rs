use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "git-sequential-stage")]
#[command(about = "Stage selected hunks from a patch into the git index, without prompts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stage the requested hunks of a patch file into the index
    Stage(StageArgs),
    /// Report per-file hunk counts for the current worktree diff
    CountHunks,
}

#[derive(Args, Debug)]
pub struct StageArgs {
    /// Path to a unified diff file (e.g. produced by `git diff HEAD`)
    #[arg(long, value_name = "FILE")]
    pub patch: PathBuf,

    /// Hunks to stage, as PATH:SPEC where SPEC is `*` or a comma-separated
    /// list of 1-based hunk numbers (repeatable)
    /// Examples: src/main.rs:1,3  config.yaml:*
    #[arg(long = "hunk", value_name = "PATH:SPEC", required = true)]
    pub hunk: Vec<String>,
}
