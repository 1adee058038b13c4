use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{trace, warn};

use super::{Fetcher, RepoSlug};
use crate::error::Result;

/// Downloads `<url>/archive/<branch>.zip` to `<output_dir>/<org>/<repo>.zip`.
pub struct ArchiveFetcher {
    output_dir: PathBuf,
    branch: String,
    client: Client,
}

impl ArchiveFetcher {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        branch: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self {
            output_dir: output_dir.into(),
            branch: branch.into(),
            client,
        })
    }

    pub fn archive_url(&self, url: &str) -> String {
        format!("{}/archive/{}.zip", url.trim_end_matches('/'), self.branch)
    }

    pub fn archive_path(&self, slug: &RepoSlug) -> PathBuf {
        self.output_dir
            .join(&slug.org)
            .join(format!("{}.zip", slug.repo))
    }

    fn download(&self, archive_url: &str, path: &Path) -> Result<()> {
        let mut response = self.client.get(archive_url).send()?.error_for_status()?;
        let mut writer = BufWriter::new(File::create(path)?);
        response.copy_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl Fetcher for ArchiveFetcher {
    fn fetch(&self, url: &str) -> Result<()> {
        let slug = RepoSlug::from_url(url)?;
        let path = self.archive_path(&slug);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let archive_url = self.archive_url(url);
        trace!("Downloading {} to {}", archive_url, path.display());
        let result = self.download(&archive_url, &path);
        if result.is_err() && path.exists() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Could not remove partial archive {}: {}", path.display(), e);
            }
        }
        result
    }
}
