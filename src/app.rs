//! Command dispatch for the CLI binary.

use std::fs;
use std::io;

use log::debug;

use crate::cli::{Command, StageArgs};
use crate::counter;
use crate::error::Error;
use crate::git::GitOps;
use crate::hunk_spec;
use crate::patch;
use crate::safety;
use crate::stager::{StageSummary, Stager};

pub struct App<G: GitOps> {
    git: G,
}

impl<G: GitOps> App<G> {
    pub fn new(git: G) -> Self {
        Self { git }
    }

    pub fn run(&self, command: Command) -> Result<(), Error> {
        self.git.version_check()?;
        match command {
            Command::Stage(args) => self.handle_stage(&args).map(|_| ()),
            Command::CountHunks => self.handle_count_hunks(),
        }
    }

    /// Arguments are validated first, then the patch is read, then the index
    /// is inspected exactly once, then the plan resolves and runs. All local
    /// failures happen before anything touches the index.
    pub fn handle_stage(&self, args: &StageArgs) -> Result<StageSummary, Error> {
        let requests = hunk_spec::parse_requests(&args.hunk)?;

        let patch_bytes = fs::read(&args.patch).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                Error::FileNotFound(args.patch.display().to_string())
            } else {
                Error::FileNotFound(format!("{}: {err}", args.patch.display()))
            }
        })?;
        let parsed = patch::parse(&patch_bytes)?;
        debug!(
            "patch {} parsed: {} file sections",
            args.patch.display(),
            parsed.files.len()
        );

        let target_paths: Vec<String> = requests.iter().map(|r| r.path.clone()).collect();
        safety::check_index(&self.git, &target_paths)?;

        let stager = Stager::new(&self.git);
        let plan = stager.resolve_plan(&parsed, &requests)?;
        stager.run(plan)
    }

    fn handle_count_hunks(&self) -> Result<(), Error> {
        for (path, count) in counter::count_hunks(&self.git)? {
            println!("{path}: {count}");
        }
        Ok(())
    }
}
