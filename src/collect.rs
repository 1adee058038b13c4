use std::collections::BTreeSet;
use std::time::Instant;

use tracing::info;

use crate::error::Result;
use crate::progress::ProgressReporter;
use crate::search::{self, SearchFilter, SearchTransport};

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub languages: Vec<String>,
    pub min_stars: u64,
    pub result_cap: u64,
    pub start_year: i32,
    pub end_year: i32,
}

/// Enumerate every repository URL matching any of the requested languages.
///
/// Per language, the creation-date history is partitioned so that each window
/// fits under the result cap, then every window is paged through to the end.
/// URLs are unioned across windows and languages.
pub fn collect_repository_urls<T>(
    transport: &T,
    options: &CollectOptions,
    reporter: &dyn ProgressReporter,
) -> Result<BTreeSet<String>>
where
    T: SearchTransport + ?Sized,
{
    let mut urls = BTreeSet::new();

    for language in &options.languages {
        let start = Instant::now();
        reporter.on_search_start(language);
        let filter = SearchFilter::new(language.as_str(), options.min_stars);

        let windows = search::partition(
            options.start_year,
            options.end_year,
            options.result_cap,
            |window| {
                let count = transport.count(&filter.for_window(window))?;
                reporter.on_window_counted(&window.to_string(), count);
                Ok(count)
            },
        )?;
        info!("{}: {} search windows under the result cap", language, windows.len());

        let mut language_urls = 0usize;
        for window in &windows {
            let page_urls = search::collect_pages(transport, &filter.for_window(window))?;
            language_urls += page_urls.len();
            urls.extend(page_urls);
            reporter.on_urls_collected(urls.len());
        }

        info!("{}: {} repository URLs", language, language_urls);
        reporter.on_search_complete(language, language_urls, start.elapsed().as_secs_f64());
    }

    Ok(urls)
}
