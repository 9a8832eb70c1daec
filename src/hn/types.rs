// src/hn/types.rs
use serde::Deserialize;

/// Errors produced by an [`ItemSource`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("decoding response body failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("item {0} not found")]
    NotFound(u64),
    /// Free-form failure, used by non-HTTP sources.
    #[error("{0}")]
    Other(String),
}

/// One record as returned by the source. Only `id` is guaranteed; everything
/// else defaults when the source omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub by: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub descendants: i64,
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    pub dead: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Item {
    /// Convenience constructor used by in-memory sources.
    pub fn new(id: u64, kind: &str, title: &str, url: &str) -> Self {
        Self {
            id,
            kind: kind.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_score(mut self, score: i64) -> Self {
        self.score = score;
        self
    }
}

#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    /// Ranked id list, best first.
    async fn top_items(&self) -> Result<Vec<u64>, FetchError>;
    async fn get_item(&self, id: u64) -> Result<Item, FetchError>;
    fn name(&self) -> &'static str;
}
