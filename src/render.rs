// src/render.rs
//! Page rendering for `GET /`.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::cache::Story;

/// Everything the index page shows.
#[derive(Debug, Clone)]
pub struct IndexPage {
    pub stories: Vec<Story>,
    /// Time spent between receiving the request and rendering.
    pub elapsed: Duration,
    pub published_at: Option<DateTime<Utc>>,
}

pub trait PageRenderer: Send + Sync {
    fn render(&self, page: &IndexPage) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct HtmlRenderer {
    pub title: String,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self {
            title: "Quiet Hacker News".to_string(),
        }
    }
}

const STYLE: &str = "body{padding:20px;font-family:sans-serif}\
ol{padding-left:2em}li{padding:6px 0}\
.host{color:#888;font-size:.85em}.meta{color:#888;font-size:.8em}\
.time{color:#aaa;font-size:.8em;margin-top:2em}";

impl PageRenderer for HtmlRenderer {
    fn render(&self, page: &IndexPage) -> anyhow::Result<String> {
        let title = encode_text(&self.title);
        let mut out = String::with_capacity(512 + page.stories.len() * 256);

        write!(
            out,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
             <h1>{title}</h1>\n"
        )?;

        if page.stories.is_empty() {
            out.push_str("<p class=\"empty\">No stories yet, check back in a moment.</p>\n");
        } else {
            out.push_str("<ol>\n");
            for s in &page.stories {
                write!(
                    out,
                    "<li><a href=\"{}\">{}</a>",
                    encode_double_quoted_attribute(&s.item.url),
                    encode_text(&s.item.title)
                )?;
                if !s.host.is_empty() {
                    write!(out, " <span class=\"host\">({})</span>", encode_text(&s.host))?;
                }
                write!(
                    out,
                    "<br><span class=\"meta\">{} points by {}</span></li>\n",
                    s.item.score,
                    encode_text(&s.item.by)
                )?;
            }
            out.push_str("</ol>\n");
        }

        write!(out, "<p class=\"time\">This page was rendered in {:?}", page.elapsed)?;
        if let Some(ts) = page.published_at {
            write!(out, ", stories as of {}", ts.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        out.push_str("</p>\n</body>\n</html>\n");
        Ok(out)
    }
}
