//! Repository search: calendar windows, result-cap partitioning and cursor
//! pagination over a [`SearchTransport`].

pub mod github;
pub mod pagination;
pub mod partition;

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use crate::error::{Error, Result};

pub use github::GitHubSearch;
pub use pagination::collect_pages;
pub use partition::partition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    Year,
    Month,
    Day,
}

/// An inclusive range of creation dates used as a search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SearchWindow {
    start: NaiveDate,
    end: NaiveDate,
    granularity: Granularity,
}

impl SearchWindow {
    pub fn new(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> Result<Self> {
        if start > end {
            return Err(Error::Other(format!(
                "search window starts after it ends: {}..{}",
                start, end
            )));
        }
        Ok(Self {
            start,
            end,
            granularity,
        })
    }

    pub fn year(year: i32) -> Result<Self> {
        let start = ymd(year, 1, 1)?;
        let end = ymd(year, 12, 31)?;
        Self::new(start, end, Granularity::Year)
    }

    pub fn month(year: i32, month: u32) -> Result<Self> {
        let start = ymd(year, month, 1)?;
        let end = ymd(year, month, days_in_month(year, month)?)?;
        Self::new(start, end, Granularity::Month)
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
            granularity: Granularity::Day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Split into the next finer calendar unit: a year into its months,
    /// a month into its days. Days do not split.
    pub fn subdivide(&self) -> Result<Vec<SearchWindow>> {
        match self.granularity {
            Granularity::Year => (1..=12)
                .map(|month| SearchWindow::month(self.start.year(), month))
                .collect(),
            Granularity::Month => Ok(self
                .start
                .iter_days()
                .take_while(|date| *date <= self.end)
                .map(SearchWindow::day)
                .collect()),
            Granularity::Day => Ok(Vec::new()),
        }
    }
}

impl fmt::Display for SearchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::Other(format!("invalid date {}-{}-{}", year, month, day)))
}

/// Number of days in the given month, accounting for leap years.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = ymd(next_year, next_month, 1)?
        .pred_opt()
        .ok_or_else(|| {
            Error::Other(format!("no day before {}-{}-01", next_year, next_month))
        })?;
    if last.month() != month {
        return Err(Error::Other(format!("invalid month {}", month)));
    }
    Ok(last.day())
}

/// Search qualifiers shared by every window of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub language: String,
    pub min_stars: u64,
}

impl SearchFilter {
    pub fn new(language: impl Into<String>, min_stars: u64) -> Self {
        Self {
            language: language.into(),
            min_stars,
        }
    }

    pub fn for_window(&self, window: &SearchWindow) -> String {
        format!(
            "is:public language:{} fork:false stars:>={} created:{}",
            self.language, self.min_stars, window
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub limit: u64,
    pub cost: u64,
    pub remaining: u64,
    pub reset_at: String,
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub total_count: u64,
    pub items: Vec<String>,
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
    pub rate_limit: Option<RateLimit>,
}

/// Request/response access to a repository search API.
pub trait SearchTransport {
    /// Total number of matches for `filter`.
    fn count(&self, filter: &str) -> Result<u64>;

    /// Fetch the page following `cursor`, or the first page when `None`.
    fn page(&self, filter: &str, cursor: Option<&str>) -> Result<ResultPage>;
}

impl<T: SearchTransport + ?Sized> SearchTransport for &T {
    fn count(&self, filter: &str) -> Result<u64> {
        (**self).count(filter)
    }

    fn page(&self, filter: &str, cursor: Option<&str>) -> Result<ResultPage> {
        (**self).page(filter, cursor)
    }
}
