use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use repo_corpus::dedupe::{HashAlgorithm, Language, TieBreak};
use repo_corpus::fetch::FetchMode;

#[derive(Debug, Parser)]
#[command(name = "repo-corpus")]
#[command(
    about = "Collect, fetch and deduplicate a corpus of public repositories",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search GitHub for repositories and write their URLs to a file
    Collect(CollectArgs),
    /// Clone or download every repository in a URL list
    Fetch(FetchArgs),
    /// Keep one source file per distinct content under a repos directory
    Dedupe(DedupeArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// GitHub access token
    #[arg(short, long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,
    /// Programming languages
    #[arg(short, long, num_args = 1.., required = true)]
    pub languages: Vec<String>,
    /// Minimum number of stars
    #[arg(short = 's', long)]
    pub min_stars: u64,
    /// Output file name
    #[arg(short, long)]
    pub output: PathBuf,
    /// Maximum results the search API returns for one query
    #[arg(long)]
    pub result_cap: Option<u64>,
    /// First creation year to search
    #[arg(long)]
    pub start_year: Option<i32>,
    /// Last creation year to search (default: current year)
    #[arg(long)]
    pub end_year: Option<i32>,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// File containing the list of repo urls
    #[arg(short = 'f', long)]
    pub url_list_file: PathBuf,
    /// Output directory
    #[arg(short, long)]
    pub output_dir: PathBuf,
    /// Number of workers to use (default: number of cores)
    #[arg(short = 'p', long)]
    pub workers: Option<usize>,
    /// Download mode
    #[arg(short, long, value_enum)]
    pub mode: FetchMode,
}

#[derive(Debug, Args)]
pub struct DedupeArgs {
    /// Directory containing cloned repos
    #[arg(short = 'i', long)]
    pub repos_dir: PathBuf,
    /// Output file
    #[arg(short, long)]
    pub output_file: PathBuf,
    /// Programming language
    #[arg(short, long, value_enum)]
    pub language: Language,
    /// Number of workers to use (default: number of cores)
    #[arg(short = 'p', long)]
    pub workers: Option<usize>,
    /// Content digest
    #[arg(long, value_enum)]
    pub hash_algorithm: Option<HashAlgorithm>,
    /// Which path to keep for duplicated content
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreak>,
}
