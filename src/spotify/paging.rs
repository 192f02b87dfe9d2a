//! Cursor-paginated collection.
//!
//! Walks a listing page by page, following each page's `next` cursor until
//! the last page, and returns the items deduplicated by a caller-chosen key
//! in first-seen order. Empty pages are skipped over; any failed page aborts
//! the whole walk.

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;

use super::domain::{Page, SpotifyError};

/// Collect every item of a paginated listing, deduplicated by `key`.
///
/// `fetch` receives `None` for the first page and the previous page's cursor
/// afterwards.
///
/// # Example
///
/// ```ignore
/// let albums = collect_pages(
///     |cursor| api.artist_albums(&artist.id, cursor),
///     |album| album.name.clone(),
/// )
/// .await?;
/// ```
pub async fn collect_pages<T, K, F, Fut>(
    mut fetch: F,
    key: impl Fn(&T) -> K,
) -> Result<Vec<T>, SpotifyError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, SpotifyError>>,
    K: Eq + Hash,
{
    let mut seen = HashSet::new();
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;

        let mut duplicates = 0usize;
        for item in page.items {
            if seen.insert(key(&item)) {
                items.push(item);
            } else {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::debug!("Page {}: dropped {} duplicates", pages, duplicates);
        }

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!("Collected {} items from {} pages", items.len(), pages);
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        name: &'static str,
    }

    fn item(id: u32, name: &'static str) -> Item {
        Item { id, name }
    }

    /// Serve pre-built pages keyed by cursor ("" for the first page).
    fn pages(list: Vec<(&'static str, Page<Item>)>) -> HashMap<String, Page<Item>> {
        list.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[tokio::test]
    async fn test_follows_cursors_to_the_end() {
        let served = pages(vec![
            ("", Page::with_next(vec![item(1, "a")], "p2")),
            ("p2", Page::with_next(vec![item(2, "b")], "p3")),
            ("p3", Page::last(vec![item(3, "c")])),
        ]);
        let result = collect_pages(
            |cursor| {
                let page = served[&cursor.unwrap_or_default()].clone();
                async move { Ok(page) }
            },
            |i: &Item| i.id,
        )
        .await
        .unwrap();
        assert_eq!(result.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_dedup_keeps_first_seen_order() {
        let served = pages(vec![
            ("", Page::with_next(vec![item(1, "a"), item(2, "b")], "p2")),
            ("p2", Page::last(vec![item(2, "b"), item(3, "c"), item(1, "a")])),
        ]);
        let result = collect_pages(
            |cursor| {
                let page = served[&cursor.unwrap_or_default()].clone();
                async move { Ok(page) }
            },
            |i: &Item| i.id,
        )
        .await
        .unwrap();
        assert_eq!(result, vec![item(1, "a"), item(2, "b"), item(3, "c")]);
    }

    #[tokio::test]
    async fn test_dedup_by_name_collapses_editions() {
        let served = pages(vec![
            ("", Page::with_next(vec![item(1, "Abbey Road")], "p2")),
            ("p2", Page::last(vec![item(2, "Abbey Road"), item(3, "Help!")])),
        ]);
        let result = collect_pages(
            |cursor| {
                let page = served[&cursor.unwrap_or_default()].clone();
                async move { Ok(page) }
            },
            |i: &Item| i.name,
        )
        .await
        .unwrap();
        assert_eq!(result, vec![item(1, "Abbey Road"), item(3, "Help!")]);
    }

    #[tokio::test]
    async fn test_empty_page_mid_stream_is_followed() {
        let served = pages(vec![
            ("", Page::with_next(vec![item(1, "a")], "p2")),
            ("p2", Page::with_next(vec![], "p3")),
            ("p3", Page::last(vec![item(2, "b")])),
        ]);
        let result = collect_pages(
            |cursor| {
                let page = served[&cursor.unwrap_or_default()].clone();
                async move { Ok(page) }
            },
            |i: &Item| i.id,
        )
        .await
        .unwrap();
        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_page_aborts_walk() {
        let mut requests = 0;
        let result = collect_pages(
            |cursor: Option<String>| {
                requests += 1;
                async move {
                    match cursor {
                        None => Ok(Page::with_next(vec![item(1, "a")], "p2")),
                        Some(_) => Err(SpotifyError::status(502, "Bad Gateway")),
                    }
                }
            },
            |i: &Item| i.id,
        )
        .await;
        assert_eq!(result, Err(SpotifyError::status(502, "Bad Gateway")));
        assert_eq!(requests, 2);
    }
}

/// Property-based tests using proptest
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every key appears exactly once, in the order it was first seen.
        #[test]
        fn dedup_is_first_seen_unique(
            raw_pages in prop::collection::vec(prop::collection::vec(0u8..20, 0..8), 1..6)
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let total = raw_pages.len();
            let collected = rt.block_on(collect_pages(
                |cursor: Option<String>| {
                    let index: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
                    let items = raw_pages[index].clone();
                    let next = (index + 1 < total).then(|| (index + 1).to_string());
                    async move { Ok(Page { items, next }) }
                },
                |v: &u8| *v,
            )).unwrap();

            let mut expected = Vec::new();
            for v in raw_pages.iter().flatten() {
                if !expected.contains(v) {
                    expected.push(*v);
                }
            }
            prop_assert_eq!(collected, expected);
        }
    }
}
