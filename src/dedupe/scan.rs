use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use glob::Pattern;
use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    C,
    Cpp,
    Python,
    Javascript,
}

impl Language {
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Java => &["java"],
            Language::C => &["c"],
            Language::Cpp => &["cpp", "cxx", "cc"],
            Language::Python => &["py"],
            Language::Javascript => &["js"],
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions().contains(&ext))
            .unwrap_or(false)
    }
}

/// Walk `root` and return the paths, relative to `root`, of regular files in
/// `language`. Symlinks are never followed or returned; paths matching any of
/// `ignore_globs` are skipped.
pub fn scan_source_files(
    root: &Path,
    language: Language,
    ignore_globs: &[String],
) -> Result<Vec<PathBuf>> {
    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .map(|glob| {
            Pattern::new(glob).map_err(|source| Error::Pattern {
                pattern: glob.clone(),
                source,
            })
        })
        .collect::<Result<_>>()?;

    let is_ignored = |entry: &DirEntry| {
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        !relative.as_os_str().is_empty()
            && ignore_patterns
                .iter()
                .any(|pattern| pattern.matches_path(relative))
    };

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::PermissionDenied) {
                    warn!("Access denied reading {:?}: {}", err.path(), err);
                    continue;
                }
                return Err(err.into());
            }
        };

        if !entry.file_type().is_file() || !language.matches(entry.path()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::Other(format!("{}: {}", entry.path().display(), e)))?;
        files.push(relative.to_path_buf());
    }

    Ok(files)
}
