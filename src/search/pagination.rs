use tracing::{debug, trace};

use super::SearchTransport;
use crate::error::{Error, Result};

/// Follow the cursor chain for `filter` until the transport reports no further
/// pages, returning every item in page order.
pub fn collect_pages<T>(transport: &T, filter: &str) -> Result<Vec<String>>
where
    T: SearchTransport + ?Sized,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = transport.page(filter, cursor.as_deref())?;
        pages += 1;
        trace!("Page {} of '{}' returned {} items", pages, filter, page.items.len());
        items.extend(page.items);

        if !page.has_next_page {
            break;
        }
        cursor = match page.end_cursor {
            Some(next) => Some(next),
            None => {
                return Err(Error::GraphQl(format!(
                    "page {} of '{}' reports more pages but no cursor",
                    pages, filter
                )))
            }
        };
    }

    debug!("Collected {} items over {} pages for '{}'", items.len(), pages, filter);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ResultPage;
    use std::cell::RefCell;

    /// Serves `pages` in order and records the cursor of every request.
    struct ScriptedPages {
        pages: Vec<ResultPage>,
        cursors: RefCell<Vec<Option<String>>>,
    }

    impl SearchTransport for ScriptedPages {
        fn count(&self, _filter: &str) -> Result<u64> {
            Ok(self.pages.iter().map(|p| p.items.len() as u64).sum())
        }

        fn page(&self, _filter: &str, cursor: Option<&str>) -> Result<ResultPage> {
            let mut cursors = self.cursors.borrow_mut();
            let index = cursors.len();
            cursors.push(cursor.map(str::to_string));
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| Error::Other("requested past the last page".to_string()))
        }
    }

    fn page(items: &[&str], next: Option<&str>) -> ResultPage {
        ResultPage {
            total_count: 0,
            items: items.iter().map(|s| s.to_string()).collect(),
            end_cursor: next.map(str::to_string),
            has_next_page: next.is_some(),
            rate_limit: None,
        }
    }

    #[test]
    fn test_follows_cursor_chain_until_last_page() {
        let transport = ScriptedPages {
            pages: vec![
                page(&["a", "b"], Some("c1")),
                page(&["c"], Some("c2")),
                page(&["d"], None),
            ],
            cursors: RefCell::new(Vec::new()),
        };

        let items = collect_pages(&transport, "q").unwrap();
        assert_eq!(items, vec!["a", "b", "c", "d"]);
        assert_eq!(
            *transport.cursors.borrow(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[test]
    fn test_single_page_issues_one_request() {
        let transport = ScriptedPages {
            pages: vec![page(&["only"], None)],
            cursors: RefCell::new(Vec::new()),
        };
        let items = collect_pages(&transport, "q").unwrap();
        assert_eq!(items, vec!["only"]);
        assert_eq!(transport.cursors.borrow().len(), 1);
    }

    #[test]
    fn test_missing_cursor_is_an_error() {
        let mut broken = page(&["a"], None);
        broken.has_next_page = true;
        let transport = ScriptedPages {
            pages: vec![broken],
            cursors: RefCell::new(Vec::new()),
        };
        assert!(matches!(collect_pages(&transport, "q"), Err(Error::GraphQl(_))));
    }

    #[test]
    fn test_transport_error_is_fatal() {
        let transport = ScriptedPages {
            pages: vec![page(&["a"], Some("c1"))],
            cursors: RefCell::new(Vec::new()),
        };
        assert!(collect_pages(&transport, "q").is_err());
        assert_eq!(transport.cursors.borrow().len(), 2);
    }
}
