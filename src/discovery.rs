use yt_api::SearchPage;

/// Results per search request, the platform maximum
pub const PAGE_SIZE: u32 = 50;

/// A paginated video search backend
pub trait VideoSearch {
    async fn search_page(
        &self,
        query: &str,
        region: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, Box<dyn std::error::Error>>;
}

impl VideoSearch for yt_api::YouTubeClient {
    async fn search_page(
        &self,
        query: &str,
        region: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, Box<dyn std::error::Error>> {
        yt_api::YouTubeClient::search_page(self, query, region, PAGE_SIZE, page_token).await
    }
}

/// Collect up to `max_results` video ids for the query, ordered by view
/// count, following the pagination cursor until the platform runs out of
/// pages. Duplicates across pages are kept.
///
/// Any request error aborts discovery entirely; there is no partial-result
/// fallback.
pub async fn find_popular<S: VideoSearch>(
    client: &S,
    query: &str,
    region: &str,
    max_results: usize,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut video_ids: Vec<String> = Vec::new();
    let mut page_token: Option<String> = None;

    while video_ids.len() < max_results {
        let page = client
            .search_page(query, region, page_token.as_deref())
            .await?;

        video_ids.extend(page.video_ids);

        page_token = page.next_page_token;
        if page_token.is_none() {
            break;
        }
    }

    video_ids.truncate(max_results);
    Ok(video_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Hands out a scripted sequence of pages, one per request
    struct StubSearch {
        pages: Mutex<VecDeque<Result<SearchPage, String>>>,
    }

    impl StubSearch {
        fn new(pages: Vec<Result<SearchPage, String>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
            }
        }

        fn remaining(&self) -> usize {
            self.pages.lock().unwrap().len()
        }
    }

    impl VideoSearch for StubSearch {
        async fn search_page(
            &self,
            _query: &str,
            _region: &str,
            _page_token: Option<&str>,
        ) -> Result<SearchPage, Box<dyn std::error::Error>> {
            let next = self
                .pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("stub ran out of pages");
            next.map_err(|e| e.into())
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> Result<SearchPage, String> {
        Ok(SearchPage {
            video_ids: ids.iter().map(|id| id.to_string()).collect(),
            next_page_token: next.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn stops_and_truncates_at_max_results() {
        let stub = StubSearch::new(vec![
            page(&["a", "b", "c"], Some("p2")),
            page(&["d", "e", "f"], Some("p3")),
            page(&["g", "h", "i"], Some("p4")),
        ]);

        let videos = find_popular(&stub, "cs2", "US", 4).await.unwrap();

        assert_eq!(videos, vec!["a", "b", "c", "d"]);
        // The third page must never have been requested
        assert_eq!(stub.remaining(), 1);
    }

    #[tokio::test]
    async fn exhausted_pagination_returns_fewer() {
        let stub = StubSearch::new(vec![
            page(&["a", "b"], Some("p2")),
            page(&["c"], None),
        ]);

        let videos = find_popular(&stub, "cs2", "US", 500).await.unwrap();

        assert_eq!(videos, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn duplicates_across_pages_are_kept() {
        let stub = StubSearch::new(vec![
            page(&["a", "b"], Some("p2")),
            page(&["b", "a"], None),
        ]);

        let videos = find_popular(&stub, "cs2", "US", 500).await.unwrap();

        assert_eq!(videos, vec!["a", "b", "b", "a"]);
    }

    #[tokio::test]
    async fn page_error_aborts_discovery() {
        let stub = StubSearch::new(vec![
            page(&["a", "b"], Some("p2")),
            Err("search request failed".to_string()),
        ]);

        let error = find_popular(&stub, "cs2", "US", 500).await.unwrap_err();

        assert!(error.to_string().contains("search request failed"));
    }
}
