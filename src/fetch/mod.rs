//! Populating a local directory tree from a list of repository URLs.

pub mod archive;
pub mod clone;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use clap::ValueEnum;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::utils;

pub use archive::ArchiveFetcher;
pub use clone::GitCloneFetcher;

pub const FAILED_LIST_NAME: &str = "failed.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Shallow `git clone` into <output>/<org>/<repo>
    Clone,
    /// Download the default-branch archive to <output>/<org>/<repo>.zip
    Zip,
}

/// Fetches one repository into the local tree.
pub trait Fetcher: Sync {
    fn fetch(&self, url: &str) -> Result<()>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<()> + Sync,
{
    fn fetch(&self, url: &str) -> Result<()> {
        self(url)
    }
}

#[derive(Debug)]
pub enum FetchOutcome {
    Fetched { url: String },
    Failed { url: String, cause: Error },
}

#[derive(Debug)]
pub struct FetchFailure {
    pub url: String,
    pub cause: Error,
}

/// Owner and repository name taken from the last two segments of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub org: String,
    pub repo: String,
}

impl RepoSlug {
    /// Segments must name a single directory: `.`, `..` and anything holding
    /// a path separator are rejected so the target stays under the output root.
    pub fn from_url(url: &str) -> Result<Self> {
        let mut segments = url
            .trim_end_matches('/')
            .rsplit('/')
            .filter(|segment| !segment.is_empty());
        match (segments.next(), segments.next()) {
            (Some(repo), Some(org))
                if !org.ends_with(':') && is_plain_segment(org) && is_plain_segment(repo) =>
            {
                Ok(Self {
                    org: org.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(Error::InvalidRepoUrl(url.to_string())),
        }
    }

    /// `<root>/<org>/<repo>`
    pub fn dir_under(&self, root: &Path) -> PathBuf {
        root.join(&self.org).join(&self.repo)
    }
}

fn is_plain_segment(segment: &str) -> bool {
    segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

/// Trailing slashes dropped so that one repository maps to one URL.
pub fn normalize_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// Read a URL list, normalising and deduplicating entries.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let urls: BTreeSet<String> = utils::read_unique_lines(path)?
        .iter()
        .map(|line| normalize_url(line))
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();
    Ok(urls.into_iter().collect())
}

/// Write the failed URLs, one per line, to `<output_dir>/failed.txt`.
pub fn write_failed_list(output_dir: &Path, failures: &[FetchFailure]) -> Result<PathBuf> {
    let path = output_dir.join(FAILED_LIST_NAME);
    let mut urls: Vec<&str> = failures.iter().map(|f| f.url.as_str()).collect();
    urls.sort_unstable();
    utils::write_lines(&path, urls)?;
    Ok(path)
}

/// Run `fetcher` over every URL on a pool of `workers` threads.
///
/// Outcomes are consumed in completion order. A failure is recorded with its
/// URL and cause and never cancels the remaining work; nothing is retried.
pub fn fetch_all<F>(
    urls: &[String],
    workers: usize,
    fetcher: &F,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<FetchFailure>>
where
    F: Fetcher + ?Sized,
{
    let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
    let total = urls.len();
    let start = Instant::now();
    reporter.on_fetch_start(total);

    let (tx, rx) = mpsc::channel::<FetchOutcome>();
    let mut failures = Vec::new();

    thread::scope(|scope| {
        let pool = &pool;
        scope.spawn(move || {
            pool.install(|| {
                urls.par_iter().for_each_with(tx, |tx, url| {
                    let outcome = match fetcher.fetch(url) {
                        Ok(()) => FetchOutcome::Fetched { url: url.clone() },
                        Err(cause) => FetchOutcome::Failed {
                            url: url.clone(),
                            cause,
                        },
                    };
                    // The receiver outlives every sender.
                    let _ = tx.send(outcome);
                });
            });
        });

        for (done, outcome) in rx.iter().enumerate() {
            match outcome {
                FetchOutcome::Fetched { url } => debug!("Fetched {}", url),
                FetchOutcome::Failed { url, cause } => {
                    warn!("Failed to fetch {}: {}", url, cause);
                    failures.push(FetchFailure { url, cause });
                }
            }
            reporter.on_fetch_progress(done + 1, total);
        }
    });

    reporter.on_fetch_complete(failures.len(), start.elapsed().as_secs_f64());
    Ok(failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_slug_from_url() {
        let slug = RepoSlug::from_url("https://github.com/rust-lang/cargo").unwrap();
        assert_eq!(slug.org, "rust-lang");
        assert_eq!(slug.repo, "cargo");

        let trailing = RepoSlug::from_url("https://github.com/rust-lang/cargo/").unwrap();
        assert_eq!(trailing, slug);
        assert_eq!(
            slug.dir_under(Path::new("/data")),
            PathBuf::from("/data/rust-lang/cargo")
        );
    }

    #[test]
    fn test_slug_rejects_short_urls() {
        assert!(RepoSlug::from_url("cargo").is_err());
        assert!(RepoSlug::from_url("https://github.com").is_err());
        assert!(RepoSlug::from_url("").is_err());
    }

    #[test]
    fn test_slug_rejects_dot_segments() {
        for url in [
            "https://github.com/../etc",
            "https://github.com/org/..",
            "https://github.com/./repo",
            "https://github.com/org/.",
            "https://github.com/org\\..\\repo/x",
        ] {
            assert!(
                matches!(RepoSlug::from_url(url), Err(Error::InvalidRepoUrl(_))),
                "{} should be rejected",
                url
            );
        }
        // Dots inside a name are fine.
        let slug = RepoSlug::from_url("https://github.com/org/repo.rs").unwrap();
        assert_eq!(slug.repo, "repo.rs");
        let dotted = RepoSlug::from_url("https://github.com/org/..hidden").unwrap();
        assert_eq!(dotted.repo, "..hidden");
    }

    #[test]
    fn test_read_url_list_merges_trailing_slash_variants() {
        let tmp = tempfile::tempdir().unwrap();
        let list = tmp.path().join("urls.txt");
        utils::write_lines(
            &list,
            [
                "https://github.com/org/repo",
                "https://github.com/org/repo/",
                "  https://github.com/org/repo//  ",
                "https://github.com/org/other",
                "/",
                "",
            ],
        )
        .unwrap();

        let urls = read_url_list(&list).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://github.com/org/other".to_string(),
                "https://github.com/org/repo".to_string(),
            ]
        );
    }

    #[test]
    fn test_write_failed_list_sorted_in_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let failures = vec![
            FetchFailure {
                url: "https://github.com/zeta/z".to_string(),
                cause: Error::Git("exit status: 128".to_string()),
            },
            FetchFailure {
                url: "https://github.com/alpha/a".to_string(),
                cause: Error::Other("timed out".to_string()),
            },
        ];

        let path = write_failed_list(tmp.path(), &failures).unwrap();
        assert_eq!(path, tmp.path().join(FAILED_LIST_NAME));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "https://github.com/alpha/a\nhttps://github.com/zeta/z\n");

        let empty = write_failed_list(tmp.path(), &[]).unwrap();
        assert_eq!(std::fs::read_to_string(empty).unwrap(), "");
    }

    #[test]
    fn test_fetch_all_records_every_failure() {
        let urls: Vec<String> = (0..20)
            .map(|i| format!("https://github.com/org/repo{}", i))
            .collect();
        let calls = AtomicUsize::new(0);
        let fetcher = |url: &str| -> Result<()> {
            calls.fetch_add(1, Ordering::SeqCst);
            let n: usize = url
                .trim_start_matches("https://github.com/org/repo")
                .parse()
                .unwrap();
            if n % 3 == 0 {
                Err(Error::Other(format!("repo{} is gone", n)))
            } else {
                Ok(())
            }
        };

        let failures = fetch_all(&urls, 4, &fetcher, &SilentReporter).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 20);
        let mut failed: Vec<&str> = failures.iter().map(|f| f.url.as_str()).collect();
        failed.sort();
        let mut expected: Vec<String> = (0..20)
            .filter(|n| n % 3 == 0)
            .map(|n| format!("https://github.com/org/repo{}", n))
            .collect();
        expected.sort();
        assert_eq!(failed, expected);
        assert!(failures
            .iter()
            .all(|f| f.cause.to_string().ends_with("is gone")));
    }

    #[test]
    fn test_fetch_all_empty_list() {
        let fetcher = |_: &str| -> Result<()> { Ok(()) };
        let failures = fetch_all(&[], 2, &fetcher, &SilentReporter).unwrap();
        assert!(failures.is_empty());
    }
}
