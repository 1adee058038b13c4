mod cli;
mod logging;
mod reporter;

use std::fs;
use std::process;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use clap::{CommandFactory, Parser};
use cli::{Cli, CollectArgs, Commands, DedupeArgs, FetchArgs};
use colored::*;
use dotenv::dotenv;
use reporter::CliReporter;
use repo_corpus::collect::{collect_repository_urls, CollectOptions};
use repo_corpus::config::{self, AppConfig};
use repo_corpus::dedupe::{self, DedupOptions};
use repo_corpus::fetch::{self, ArchiveFetcher, FetchMode, GitCloneFetcher};
use repo_corpus::search::GitHubSearch;
use repo_corpus::utils;
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let args = Cli::parse();

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Collect(args)) => run_collect(&config, args),
        Some(Commands::Fetch(args)) => run_fetch(&config, args),
        Some(Commands::Dedupe(args)) => run_dedupe(&config, args),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
}

fn run_collect(config: &AppConfig, args: CollectArgs) -> Result<()> {
    let search = &config.search;
    let options = CollectOptions {
        languages: args.languages,
        min_stars: args.min_stars,
        result_cap: args.result_cap.unwrap_or(search.result_cap),
        start_year: args.start_year.unwrap_or(search.start_year),
        end_year: args
            .end_year
            .or(search.end_year)
            .unwrap_or_else(|| Local::now().year()),
    };
    info!(
        "Searching {:?} with at least {} stars, created {}..={}",
        options.languages, options.min_stars, options.start_year, options.end_year
    );

    let transport = GitHubSearch::new(search, args.token)?;
    let reporter = CliReporter::new();
    let urls = collect_repository_urls(&transport, &options, &reporter)?;

    utils::write_lines(&args.output, &urls)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!(
        "{} unique repository URLs written to {}",
        format!("{}", urls.len()).green(),
        args.output.display()
    );
    Ok(())
}

fn run_fetch(config: &AppConfig, args: FetchArgs) -> Result<()> {
    let urls = fetch::read_url_list(&args.url_list_file)
        .with_context(|| format!("reading {}", args.url_list_file.display()))?;
    info!("Number of repos: {}", urls.len());

    let workers = config::resolve_workers(args.workers, config.fetch.workers)?;
    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("creating {}", args.output_dir.display()))?;

    let reporter = CliReporter::new();
    let failures = match args.mode {
        FetchMode::Clone => {
            let fetcher = GitCloneFetcher::new(&args.output_dir, config.fetch.git_program.as_str());
            fetch::fetch_all(&urls, workers, &fetcher, &reporter)?
        }
        FetchMode::Zip => {
            let fetcher = ArchiveFetcher::new(
                &args.output_dir,
                config.fetch.archive_branch.as_str(),
                &config.search.user_agent,
            )?;
            fetch::fetch_all(&urls, workers, &fetcher, &reporter)?
        }
    };

    let failed_path = fetch::write_failed_list(&args.output_dir, &failures)
        .with_context(|| format!("writing failure list in {}", args.output_dir.display()))?;

    if failures.is_empty() {
        info!("All {} repositories fetched", format!("{}", urls.len()).green());
    } else {
        warn!(
            "{} of {} repositories failed, see {}",
            format!("{}", failures.len()).red(),
            urls.len(),
            failed_path.display()
        );
    }
    Ok(())
}

fn run_dedupe(config: &AppConfig, args: DedupeArgs) -> Result<()> {
    let workers = config::resolve_workers(args.workers, config.dedupe.workers)?;
    let files = dedupe::scan_source_files(
        &args.repos_dir,
        args.language,
        &config.dedupe.ignore_patterns,
    )
    .with_context(|| format!("scanning {}", args.repos_dir.display()))?;
    info!(
        "Number of {:?} files before deduplication: {}",
        args.language,
        files.len()
    );

    let options = DedupOptions {
        workers,
        hash_algorithm: args.hash_algorithm.unwrap_or(config.dedupe.hash_algorithm),
        tie_break: args.tie_break.unwrap_or(config.dedupe.tie_break),
    };
    let reporter = CliReporter::new();
    let report = dedupe::deduplicate(&args.repos_dir, files, &options, &reporter)?;

    info!(
        "Number of {:?} files after deduplication: {}",
        args.language,
        format!("{}", report.distinct()).green()
    );
    if !report.skipped.is_empty() {
        warn!(
            "{} files could not be read and were left out",
            format!("{}", report.skipped.len()).red()
        );
    }

    report
        .write_kept_paths(&args.output_file)
        .with_context(|| format!("writing {}", args.output_file.display()))?;
    Ok(())
}
