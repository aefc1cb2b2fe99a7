//! Cursor-driven pagination for account history endpoints

use tracing::warn;

use crate::error::ExchangeResult;

/// Upper bound on pages fetched for one listing
pub const MAX_PAGES: usize = 50;

/// Collect items page by page.
///
/// `fetch` receives the cursor of the previous page (`None` for the first)
/// and returns the page plus the cursor to continue from. Paging stops when
/// no cursor comes back, the cursor repeats, or `max_pages` pages were read.
pub fn collect_pages<T, C, F>(max_pages: usize, mut fetch: F) -> ExchangeResult<Vec<T>>
where
    C: PartialEq,
    F: FnMut(Option<&C>) -> ExchangeResult<(Vec<T>, Option<C>)>,
{
    let mut items = Vec::new();
    let mut cursor: Option<C> = None;

    for _ in 0..max_pages {
        let (page, next) = fetch(cursor.as_ref())?;
        items.extend(page);

        match next {
            Some(next) if cursor.as_ref() != Some(&next) => cursor = Some(next),
            _ => return Ok(items),
        }
    }

    warn!("Stopped after {} pages with more history available", max_pages);
    Ok(items)
}

/// Continuation cursor for endpoints that signal more data with a full page
pub fn next_if_full<C>(page_len: usize, limit: usize, cursor: Option<C>) -> Option<C> {
    if page_len >= limit {
        cursor
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExchangeError;

    #[test]
    fn test_collect_pages_follows_cursor() {
        let pages = vec![vec![1, 2], vec![3, 4], vec![5]];
        let mut seen = Vec::new();

        let items = collect_pages(MAX_PAGES, |cursor: Option<&usize>| {
            seen.push(cursor.copied());
            let idx = cursor.copied().unwrap_or(0);
            let next = (idx + 1 < pages.len()).then_some(idx + 1);
            Ok((pages[idx].clone(), next))
        })
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(seen, vec![None, Some(1), Some(2)]);
    }

    #[test]
    fn test_collect_pages_stops_on_repeated_cursor() {
        let mut calls = 0;
        let items = collect_pages(MAX_PAGES, |_: Option<&String>| {
            calls += 1;
            Ok((vec![calls], Some("same".to_string())))
        })
        .unwrap();

        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_collect_pages_caps_page_count() {
        let items = collect_pages(3, |cursor: Option<&u32>| {
            let next = cursor.copied().unwrap_or(0) + 1;
            Ok((vec![next], Some(next)))
        })
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_collect_pages_propagates_errors() {
        let result = collect_pages(MAX_PAGES, |cursor: Option<&u32>| match cursor {
            None => Ok((vec![1], Some(1))),
            Some(_) => Err(ExchangeError::Parse("bad page".to_string())),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_next_if_full() {
        assert_eq!(next_if_full(100, 100, Some(7)), Some(7));
        assert_eq!(next_if_full(99, 100, Some(7)), None);
        assert_eq!(next_if_full::<u32>(100, 100, None), None);
    }
}
