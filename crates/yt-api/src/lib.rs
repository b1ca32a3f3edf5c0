use serde_json::Value;

/// Production base URL for the YouTube Data API v3
pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// One page of video search results
#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Video ids in result order; duplicates across pages are possible
    pub video_ids: Vec<String>,
    /// Cursor for the next page; `None` means the results are exhausted
    pub next_page_token: Option<String>,
}

/// YouTube Data API client bound to an OAuth access token
pub struct YouTubeClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl YouTubeClient {
    /// Create a client against the production API
    pub fn new(access_token: &str) -> Self {
        Self::with_base_url(access_token, YOUTUBE_API_BASE_URL)
    }

    /// Create a client against a custom base URL (tests and mock servers)
    pub fn with_base_url(access_token: &str, base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Fetch one page of video search results ordered by view count,
    /// filtered to video-type results in the given region.
    pub async fn search_page(
        &self,
        query: &str,
        region: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<SearchPage, Box<dyn std::error::Error>> {
        let url = format!("{}/search", self.base_url);
        let page_size = page_size.to_string();

        let mut params = vec![
            ("part", "snippet"),
            ("q", query),
            ("regionCode", region),
            ("maxResults", page_size.as_str()),
            ("type", "video"),
            ("order", "viewCount"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!("Search request failed (status {}): {}", status, body).into());
        }

        let body: Value = response.json().await?;

        let items = body
            .get("items")
            .and_then(|items| items.as_array())
            .ok_or("Search response missing 'items' field")?;

        // Only video results carry an id.videoId; anything else is skipped
        let video_ids = items
            .iter()
            .filter_map(|item| item.get("id"))
            .filter_map(|id| id.get("videoId"))
            .filter_map(|id| id.as_str())
            .map(|id| id.to_string())
            .collect();

        let next_page_token = body
            .get("nextPageToken")
            .and_then(|token| token.as_str())
            .map(|s| s.to_string());

        Ok(SearchPage {
            video_ids,
            next_page_token,
        })
    }

    /// Insert a top-level comment on a video
    pub async fn insert_comment(
        &self,
        video_id: &str,
        text: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let url = format!("{}/commentThreads", self.base_url);

        let request_body = serde_json::json!({
            "snippet": {
                "videoId": video_id,
                "topLevelComment": {
                    "snippet": {
                        "textOriginal": text
                    }
                }
            }
        });

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .query(&[("part", "snippet")])
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await?;
            return Err(format!("Comment insert failed (status {}): {}", status, body).into());
        }

        Ok(())
    }
}
