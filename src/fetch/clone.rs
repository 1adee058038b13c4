use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::trace;

use super::{Fetcher, RepoSlug};
use crate::error::{Error, Result};

/// Shallow-clones each repository into `<output_dir>/<org>/<repo>` with the
/// external `git` command.
pub struct GitCloneFetcher {
    output_dir: PathBuf,
    git_program: String,
}

impl GitCloneFetcher {
    pub fn new(output_dir: impl Into<PathBuf>, git_program: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            git_program: git_program.into(),
        }
    }

    fn command(&self, url: &str, target: &std::path::Path) -> Command {
        let mut command = Command::new(&self.git_program);
        // askPass=echo makes private or missing repositories fail instead of
        // prompting for credentials.
        command
            .args(["clone", "-c", "core.askPass=echo", "-q", "--depth", "1"])
            .arg(url)
            .arg(target)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null());
        command
    }
}

impl Fetcher for GitCloneFetcher {
    fn fetch(&self, url: &str) -> Result<()> {
        let slug = RepoSlug::from_url(url)?;
        let target = slug.dir_under(&self.output_dir);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        trace!("Cloning {} into {}", url, target.display());
        let status = self.command(url, &target).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(Error::Git(status.to_string()))
        }
    }
}
