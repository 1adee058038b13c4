//! Content-hash deduplication of source files across a downloaded corpus.

pub mod hasher;
pub mod scan;

use std::collections::hash_map::Entry;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use ahash::AHashMap;
use clap::ValueEnum;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::utils;

pub use hasher::{ContentHash, HashAlgorithm};
pub use scan::{scan_source_files, Language};

/// One representative relative path per distinct content hash.
pub type DedupMap = AHashMap<ContentHash, PathBuf>;

/// Which path represents a hash seen more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Lexicographically smallest path; stable across runs
    #[default]
    SmallestPath,
    /// First path within a partition, later partitions overwrite earlier ones
    LastMerged,
}

#[derive(Debug, Clone)]
pub struct DedupOptions {
    pub workers: usize,
    pub hash_algorithm: HashAlgorithm,
    pub tie_break: TieBreak,
}

#[derive(Debug)]
pub struct FileRecord {
    pub relative_path: PathBuf,
    pub content_hash: ContentHash,
}

/// A file that could not be read and so took no part in deduplication.
#[derive(Debug)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub cause: io::Error,
}

#[derive(Debug, Default)]
pub struct DedupReport {
    pub kept: DedupMap,
    pub scanned: usize,
    pub skipped: Vec<SkippedFile>,
}

impl DedupReport {
    pub fn distinct(&self) -> usize {
        self.kept.len()
    }

    pub fn kept_paths_sorted(&self) -> Vec<&PathBuf> {
        let mut paths: Vec<&PathBuf> = self.kept.values().collect();
        paths.sort();
        paths
    }

    /// Write the kept relative paths, sorted, one per line.
    pub fn write_kept_paths(&self, path: &Path) -> Result<usize> {
        let kept = self.kept_paths_sorted();
        Ok(utils::write_lines(path, kept.iter().map(|p| p.to_string_lossy()))?)
    }
}

#[derive(Default)]
struct PartitionResult {
    map: DedupMap,
    skipped: Vec<SkippedFile>,
}

/// Hash every file under `root` listed in `files` and keep one path per
/// distinct content.
///
/// The list is shuffled and split into `options.workers` contiguous
/// partitions, each hashed on its own thread of a dedicated pool into a local
/// map. The partition maps are merged once every worker has finished.
pub fn deduplicate(
    root: &Path,
    mut files: Vec<PathBuf>,
    options: &DedupOptions,
    reporter: &dyn ProgressReporter,
) -> Result<DedupReport> {
    if options.workers == 0 {
        return Err(Error::Other("worker count must be at least 1".to_string()));
    }

    let total = files.len();
    files.shuffle(&mut rand::thread_rng());
    let partitions = split_evenly(files, options.workers);

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()?;
    let hashed = AtomicUsize::new(0);
    let start = Instant::now();
    reporter.on_hash_start(total);

    let results: Vec<PartitionResult> = pool.install(|| {
        partitions
            .into_par_iter()
            .map(|partition| {
                hash_partition(root, partition, options, || {
                    let done = hashed.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_hash_progress(done, total);
                })
            })
            .collect()
    });

    let mut report = DedupReport {
        scanned: total,
        ..DedupReport::default()
    };
    for result in results {
        merge_into(&mut report.kept, result.map, options.tie_break);
        report.skipped.extend(result.skipped);
    }

    reporter.on_hash_complete(report.distinct(), start.elapsed().as_secs_f64());
    Ok(report)
}

fn hash_partition<F>(
    root: &Path,
    partition: Vec<PathBuf>,
    options: &DedupOptions,
    on_hashed: F,
) -> PartitionResult
where
    F: Fn(),
{
    let mut result = PartitionResult::default();
    for relative_path in partition {
        match options.hash_algorithm.hash_file(&root.join(&relative_path)) {
            Ok(content_hash) => {
                trace!("{} {}", content_hash, relative_path.display());
                let record = FileRecord {
                    relative_path,
                    content_hash,
                };
                keep_representative(&mut result.map, record, options.tie_break);
            }
            Err(cause) => {
                warn!("Error processing file '{}': {}", relative_path.display(), cause);
                result.skipped.push(SkippedFile {
                    path: relative_path,
                    cause,
                });
            }
        }
        on_hashed();
    }
    debug!(
        "Partition done: {} distinct, {} skipped",
        result.map.len(),
        result.skipped.len()
    );
    result
}

/// Within one partition the first path wins unless the policy prefers the
/// smallest one.
fn keep_representative(map: &mut DedupMap, record: FileRecord, tie_break: TieBreak) {
    match map.entry(record.content_hash) {
        Entry::Vacant(slot) => {
            slot.insert(record.relative_path);
        }
        Entry::Occupied(mut slot) => {
            if tie_break == TieBreak::SmallestPath && record.relative_path < *slot.get() {
                slot.insert(record.relative_path);
            }
        }
    }
}

/// Fold a partition map into the global one. Under `LastMerged` the incoming
/// path replaces an existing one for the same hash.
pub fn merge_into(global: &mut DedupMap, local: DedupMap, tie_break: TieBreak) {
    for (content_hash, path) in local {
        match tie_break {
            TieBreak::LastMerged => {
                global.insert(content_hash, path);
            }
            TieBreak::SmallestPath => {
                keep_representative(
                    global,
                    FileRecord {
                        relative_path: path,
                        content_hash,
                    },
                    tie_break,
                );
            }
        }
    }
}

/// Split `items` into `parts` contiguous runs whose lengths differ by at most
/// one; the first `len % parts` runs hold the extra element.
pub fn split_evenly<T>(items: Vec<T>, parts: usize) -> Vec<Vec<T>> {
    let parts = parts.max(1);
    let base = items.len() / parts;
    let extra = items.len() % parts;
    let mut items = items.into_iter();
    (0..parts)
        .map(|i| {
            let size = base + usize::from(i < extra);
            items.by_ref().take(size).collect()
        })
        .collect()
}
