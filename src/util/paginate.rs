use crate::storage::error::StorageResult;
use std::future::Future;
use tracing::{debug, warn};

/// One page of a listing that is continued with a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Present iff more pages remain.
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }

    /// A page with no continuation.
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// Drive a paged listing to completion.
///
/// `fetch_page` is called with `None` first and then with each returned token
/// until a page comes back without one. Items are concatenated in page order.
///
/// If a page fetch exhausts its retries the listing stops and the items
/// gathered so far are returned: a partial snapshot is a normal outcome here.
/// Any other error is propagated.
pub async fn list_all<T, F, Fut>(operation_name: &str, fetch_page: F) -> StorageResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = StorageResult<Page<T>>>,
{
    drain_pages(operation_name, fetch_page, true).await
}

/// Drive a paged listing to completion, failing if any page cannot be fetched.
///
/// Used where the complete result set is needed, such as uniqueness checks:
/// a page that exhausts its retries is reported as `RetriesExhausted`.
pub async fn list_all_strict<T, F, Fut>(
    operation_name: &str,
    fetch_page: F,
) -> StorageResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = StorageResult<Page<T>>>,
{
    drain_pages(operation_name, fetch_page, false).await
}

async fn drain_pages<T, F, Fut>(
    operation_name: &str,
    mut fetch_page: F,
    partial_on_exhaustion: bool,
) -> StorageResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = StorageResult<Page<T>>>,
{
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut page_count = 0usize;

    loop {
        let page = match fetch_page(page_token.take()).await {
            Ok(page) => page,
            Err(e) if partial_on_exhaustion && e.is_retries_exhausted() => {
                warn!(
                    "Stopping {} early after page_count={}, returning partial item_count={}: {}",
                    operation_name,
                    page_count,
                    all_items.len(),
                    e
                );
                break;
            }
            Err(e) => return Err(e),
        };

        page_count += 1;
        all_items.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    debug!(
        "Listed {} in page_count={}, item_count={}",
        operation_name,
        page_count,
        all_items.len()
    );
    Ok(all_items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::error::StorageError;
    use std::sync::{Arc, Mutex};

    fn fake_pages(sizes: &[usize]) -> Vec<Page<String>> {
        let count = sizes.len();
        sizes
            .iter()
            .enumerate()
            .map(|(page_idx, size)| {
                let items = (0..*size).map(|i| format!("p{}-i{}", page_idx, i)).collect();
                let token = (page_idx + 1 < count).then(|| format!("token-{}", page_idx + 1));
                Page::new(items, token)
            })
            .collect()
    }

    fn token_index(token: Option<String>) -> usize {
        token
            .and_then(|t| t.strip_prefix("token-").map(|n| n.parse().unwrap()))
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_list_all_concatenates_pages_in_order() {
        let pages = fake_pages(&[3, 1, 4, 2]);
        let seen_tokens = Arc::new(Mutex::new(Vec::new()));

        let items = list_all("fake_listing", |token| {
            seen_tokens.lock().unwrap().push(token.clone());
            let page = pages[token_index(token)].clone();
            async move { Ok(page) }
        })
        .await
        .unwrap();

        let expected: Vec<String> = pages.iter().flat_map(|p| p.items.clone()).collect();
        assert_eq!(items, expected);
        assert_eq!(items.len(), 10);
        assert_eq!(
            *seen_tokens.lock().unwrap(),
            vec![
                None,
                Some("token-1".to_string()),
                Some("token-2".to_string()),
                Some("token-3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_all_single_empty_page() {
        let items: Vec<String> = list_all("empty", |_| async { Ok(Page::last(vec![])) })
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_list_all_empty_token_terminates() {
        let calls = Arc::new(Mutex::new(0));
        let items = list_all("empty_token", |_| {
            *calls.lock().unwrap() += 1;
            async { Ok(Page::new(vec![1, 2], Some(String::new()))) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_all_partial_on_exhaustion() {
        let pages = fake_pages(&[2, 2, 2]);

        let items = list_all("flaky_listing", |token| {
            let idx = token_index(token);
            let result = if idx == 2 {
                Err(StorageError::RetriesExhausted {
                    operation: "page".to_string(),
                    attempts: 5,
                    last_error: "timeout".to_string(),
                })
            } else {
                Ok(pages[idx].clone())
            };
            async move { result }
        })
        .await
        .unwrap();

        assert_eq!(items, vec!["p0-i0", "p0-i1", "p1-i0", "p1-i1"]);
    }

    #[tokio::test]
    async fn test_list_all_strict_fails_on_exhaustion() {
        let pages = fake_pages(&[2, 2, 2]);

        let result = list_all_strict("strict_listing", |token| {
            let idx = token_index(token);
            let result = if idx == 1 {
                Err(StorageError::RetriesExhausted {
                    operation: "page".to_string(),
                    attempts: 5,
                    last_error: "timeout".to_string(),
                })
            } else {
                Ok(pages[idx].clone())
            };
            async move { result }
        })
        .await;

        assert!(result.unwrap_err().is_retries_exhausted());
    }

    #[tokio::test]
    async fn test_list_all_strict_concatenates_pages() {
        let pages = fake_pages(&[1, 3]);
        let items = list_all_strict("strict_listing", |token| {
            let page = pages[token_index(token)].clone();
            async move { Ok(page) }
        })
        .await
        .unwrap();
        assert_eq!(items, vec!["p0-i0", "p1-i0", "p1-i1", "p1-i2"]);
    }

    #[tokio::test]
    async fn test_list_all_propagates_other_errors() {
        let result: StorageResult<Vec<String>> = list_all("broken", |_| async {
            Err(StorageError::ConfigError("bad query".to_string()))
        })
        .await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
