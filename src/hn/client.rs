// src/hn/client.rs
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::hn::types::{FetchError, Item, ItemSource};

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Hacker News Firebase API client. Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct HnClient {
    http: reqwest::Client,
    base_url: String,
}

impl HnClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("quiet-hn/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn top_stories_url(&self) -> String {
        format!("{}/topstories.json", self.base_url)
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ItemSource for HnClient {
    async fn top_items(&self) -> Result<Vec<u64>, FetchError> {
        self.get_json(&self.top_stories_url()).await
    }

    async fn get_item(&self, id: u64) -> Result<Item, FetchError> {
        // Unknown ids come back as a literal `null`.
        let item: Option<Item> = self.get_json(&self.item_url(id)).await?;
        item.ok_or(FetchError::NotFound(id))
    }

    fn name(&self) -> &'static str {
        "hacker-news"
    }
}
