/// Trait for reporting progress of the long-running phases.
///
/// The CLI implements it with tracing/indicatif; tests use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_search_start(&self, _language: &str) {}
    fn on_window_counted(&self, _window: &str, _count: u64) {}
    fn on_urls_collected(&self, _total_urls: usize) {}
    fn on_search_complete(&self, _language: &str, _urls: usize, _duration_secs: f64) {}
    fn on_fetch_start(&self, _total: usize) {}
    fn on_fetch_progress(&self, _done: usize, _total: usize) {}
    fn on_fetch_complete(&self, _failed: usize, _duration_secs: f64) {}
    fn on_hash_start(&self, _total_files: usize) {}
    fn on_hash_progress(&self, _files_hashed: usize, _total_files: usize) {}
    fn on_hash_complete(&self, _distinct: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
