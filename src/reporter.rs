use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use repo_corpus::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

fn completion_line(summary: &str) -> String {
    format!("  {} {}", "✓".green(), summary)
}

/// CLI progress reporter using indicatif progress bars.
///
/// - Search phase: spinner (windows are discovered as counting proceeds)
/// - Fetch and hash phases: progress bar (totals known up front)
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }

    fn counting_bar(total: usize, label: &str, unit: &str) -> ProgressBar {
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::with_template(&format!(
                "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} {} ({{eta}} remaining)",
                label, unit
            ))
            .unwrap()
            .progress_chars("━╸─")
            .tick_chars(TICK_CHARS),
        );
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

impl ProgressReporter for CliReporter {
    fn on_search_start(&self, language: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars(TICK_CHARS),
        );
        pb.set_message(format!("Searching {} repositories...", language));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_window_counted(&self, window: &str, count: u64) {
        self.with_bar(|pb| pb.set_message(format!("Counting... {} has {} matches", window, count)));
    }

    fn on_urls_collected(&self, total_urls: usize) {
        self.with_bar(|pb| pb.set_message(format!("Collecting... {} URLs so far", total_urls)));
    }

    fn on_search_complete(&self, language: &str, urls: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "{}",
            completion_line(&format!(
                "Search complete: {} {} URLs in {:.2}s",
                urls, language, duration_secs
            ))
        );
    }

    fn on_fetch_start(&self, total: usize) {
        self.set_bar(Self::counting_bar(total, "Fetching", "repos"));
    }

    fn on_fetch_progress(&self, done: usize, _total: usize) {
        self.with_bar(|pb| pb.set_position(done as u64));
    }

    fn on_fetch_complete(&self, failed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "{}",
            completion_line(&format!(
                "Fetch complete: {} failures in {:.2}s",
                failed, duration_secs
            ))
        );
    }

    fn on_hash_start(&self, total_files: usize) {
        self.set_bar(Self::counting_bar(total_files, "Hashing", "files"));
    }

    fn on_hash_progress(&self, files_hashed: usize, _total_files: usize) {
        self.with_bar(|pb| pb.set_position(files_hashed as u64));
    }

    fn on_hash_complete(&self, distinct: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "{}",
            completion_line(&format!(
                "Hash complete: {} distinct files in {:.2}s",
                distinct, duration_secs
            ))
        );
    }
}
