// src/cache/story.rs
use url::{Host, Url};

use crate::hn::Item;

/// An [`Item`] that passed classification, with the fields the page needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub item: Item,
    /// Hostname without a leading `www.`; empty when the url does not parse.
    pub host: String,
    /// Position of the id in the ranked list the cycle started from.
    pub order: usize,
}

impl Story {
    pub fn new(item: Item, order: usize) -> Self {
        let host = host_of(&item.url);
        Self { item, host, order }
    }
}

/// Only link stories are served: `type == "story"` with a non-empty url.
pub fn is_story_link(item: &Item) -> bool {
    item.kind == "story" && !item.url.is_empty()
}

/// Display hostname for `raw`. Hosts come back lowercased, and punycode
/// labels are turned back into Unicode.
pub fn host_of(raw: &str) -> String {
    let Ok(url) = Url::parse(raw) else {
        return String::new();
    };
    let host = match url.host() {
        Some(Host::Domain(d)) => url::quirks::domain_to_unicode(d),
        Some(Host::Ipv4(a)) => a.to_string(),
        Some(Host::Ipv6(a)) => a.to_string(),
        None => return String::new(),
    };
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}
