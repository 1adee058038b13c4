pub mod collect;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod fetch;
pub mod progress;
pub mod search;
pub mod utils;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use progress::{ProgressReporter, SilentReporter};
