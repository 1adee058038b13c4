use tracing::{debug, trace};

use super::{Granularity, SearchWindow};
use crate::error::{Error, Result};

/// Split `start_year..=end_year` into windows whose match count fits under
/// `cap`.
///
/// Each year is counted first; years over the cap are split into months and
/// months over the cap into days. Windows with no matches are dropped without
/// counting their children. A single day still over the cap is an error, since
/// the search API could not page through all of its results.
pub fn partition<F>(
    start_year: i32,
    end_year: i32,
    cap: u64,
    mut count: F,
) -> Result<Vec<SearchWindow>>
where
    F: FnMut(&SearchWindow) -> Result<u64>,
{
    if start_year > end_year {
        return Err(Error::Other(format!(
            "start year {} is after end year {}",
            start_year, end_year
        )));
    }

    let mut leaves = Vec::new();
    for year in start_year..=end_year {
        visit(SearchWindow::year(year)?, cap, &mut count, &mut leaves)?;
    }
    Ok(leaves)
}

fn visit<F>(
    window: SearchWindow,
    cap: u64,
    count: &mut F,
    leaves: &mut Vec<SearchWindow>,
) -> Result<()>
where
    F: FnMut(&SearchWindow) -> Result<u64>,
{
    let matches = count(&window)?;
    if matches == 0 {
        trace!("No matches in {}", window);
        return Ok(());
    }
    if matches <= cap {
        trace!("{} matches in {}", matches, window);
        leaves.push(window);
        return Ok(());
    }
    if window.granularity() == Granularity::Day {
        return Err(Error::WindowOverCap {
            window,
            count: matches,
            cap,
        });
    }

    debug!(
        "{} matches in {} exceed cap of {}, splitting",
        matches, window, cap
    );
    for child in window.subdivide()? {
        visit(child, cap, count, leaves)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_under_cap_is_single_leaf() {
        let mut queried = Vec::new();
        let leaves = partition(2021, 2021, 1000, |w| {
            queried.push(*w);
            Ok(500)
        })
        .unwrap();
        assert_eq!(leaves, vec![SearchWindow::year(2021).unwrap()]);
        assert_eq!(queried.len(), 1);
    }

    #[test]
    fn test_year_over_cap_queries_exactly_twelve_months() {
        let mut queried = Vec::new();
        let leaves = partition(2021, 2021, 1000, |w| {
            queried.push(*w);
            Ok(match w.granularity() {
                Granularity::Year => 1500,
                _ => 125,
            })
        })
        .unwrap();

        let month_queries = queried
            .iter()
            .filter(|w| w.granularity() == Granularity::Month)
            .count();
        assert_eq!(month_queries, 12);
        assert!(queried.iter().all(|w| w.granularity() != Granularity::Day));
        assert_eq!(leaves.len(), 12);
        assert!(!leaves.contains(&SearchWindow::year(2021).unwrap()));
    }

    #[test]
    fn test_zero_windows_are_not_subdivided() {
        let mut queried = Vec::new();
        let leaves = partition(2019, 2021, 10, |w| {
            queried.push(*w);
            Ok(if w.start().year() == 2020 { 0 } else { 3 })
        })
        .unwrap();
        assert_eq!(queried.len(), 3);
        assert_eq!(leaves.len(), 2);
        assert!(leaves.iter().all(|w| w.start().year() != 2020));
    }

    #[test]
    fn test_month_over_cap_splits_into_days_that_tile_the_month() {
        // February 2024 is over the cap; every other month is empty.
        let leaves = partition(2024, 2024, 100, |w| {
            Ok(match w.granularity() {
                Granularity::Year => 2900,
                Granularity::Month if w.start().month() == 2 => 2900,
                Granularity::Month => 0,
                Granularity::Day => 100,
            })
        })
        .unwrap();

        assert_eq!(leaves.len(), 29);
        assert_eq!(leaves[0].start(), date(2024, 2, 1));
        assert_eq!(leaves[28].end(), date(2024, 2, 29));
        for pair in leaves.windows(2) {
            assert_eq!(pair[0].end().succ_opt().unwrap(), pair[1].start());
        }
    }

    #[test]
    fn test_every_leaf_is_ordered_and_within_cap() {
        let cap = 50;
        let leaves = partition(2010, 2012, cap, |w| {
            let days = (w.end() - w.start()).num_days() as u64 + 1;
            Ok(days / 2)
        })
        .unwrap();
        assert!(!leaves.is_empty());
        for leaf in &leaves {
            assert!(leaf.start() <= leaf.end());
            let days = (leaf.end() - leaf.start()).num_days() as u64 + 1;
            assert!(days / 2 <= cap);
        }
    }

    #[test]
    fn test_day_over_cap_is_fatal() {
        let result = partition(2021, 2021, 10, |_| Ok(11));
        match result {
            Err(Error::WindowOverCap { window, count, cap }) => {
                assert_eq!(window.granularity(), Granularity::Day);
                assert_eq!(window.start(), date(2021, 1, 1));
                assert_eq!(count, 11);
                assert_eq!(cap, 10);
            }
            other => panic!("expected WindowOverCap, got {:?}", other),
        }
    }

    #[test]
    fn test_count_error_aborts() {
        let mut calls = 0;
        let result = partition(2020, 2021, 10, |_| {
            calls += 1;
            Err(Error::Other("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_inverted_year_span_is_rejected() {
        assert!(partition(2022, 2021, 10, |_| Ok(1)).is_err());
    }
}
