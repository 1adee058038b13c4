use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

use crate::dedupe::{HashAlgorithm, TieBreak};
use crate::error::{Error, Result};

pub const DEFAULT_GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";

/// GitHub search stops returning results past this many matches per query.
pub const DEFAULT_RESULT_CAP: u64 = 1000;

/// First year with public GitHub repositories.
pub const DEFAULT_START_YEAR: i32 = 2008;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    pub dedupe: DedupeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    pub endpoint: String,
    pub result_cap: u64,
    pub page_size: u32,
    pub start_year: i32,
    /// Defaults to the current year when unset.
    pub end_year: Option<i32>,
    pub user_agent: String,
    /// Per-request timeout for search queries; no timeout when unset.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    pub git_program: String,
    pub archive_branch: String,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DedupeConfig {
    pub hash_algorithm: HashAlgorithm,
    pub tie_break: TieBreak,
    pub ignore_patterns: Vec<String>,
    pub workers: Option<usize>,
}

/// Layers built-in defaults, an optional `Config.toml` and `REPO_CORPUS__*`
/// environment variables, in that order.
pub fn load_configuration() -> std::result::Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .set_default("search.endpoint", DEFAULT_GRAPHQL_ENDPOINT)?
        .set_default("search.result_cap", DEFAULT_RESULT_CAP)?
        .set_default("search.page_size", 100)?
        .set_default("search.start_year", DEFAULT_START_YEAR)?
        .set_default(
            "search.user_agent",
            concat!("repo-corpus/", env!("CARGO_PKG_VERSION")),
        )?
        .set_default("fetch.git_program", "git")?
        .set_default("fetch.archive_branch", "master")?
        .set_default("dedupe.hash_algorithm", "xxh3")?
        .set_default("dedupe.tie_break", "smallest-path")?
        .set_default("dedupe.ignore_patterns", Vec::<String>::new())?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("REPO_CORPUS")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("dedupe.ignore_patterns")
                .try_parsing(true),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Resolve a worker count: explicit value first, then the configured one,
/// then the number of available cores.
pub fn resolve_workers(explicit: Option<usize>, configured: Option<usize>) -> Result<usize> {
    match explicit.or(configured) {
        Some(0) => Err(Error::Other("worker count must be at least 1".to_string())),
        Some(n) => Ok(n),
        None => Ok(std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)),
    }
}
