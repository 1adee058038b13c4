use thiserror::Error;

use crate::search::SearchWindow;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Query failed with status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Search window {window} holds {count} results, over the cap of {cap}")]
    WindowOverCap {
        window: SearchWindow,
        count: u64,
        cap: u64,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("Not a repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("git exited with {0}")]
    Git(String),

    #[error("{0}")]
    Other(String),
}
