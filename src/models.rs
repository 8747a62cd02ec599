//! Data models for harvested news records.
//!
//! This module defines the shapes that flow through the harvest pipeline:
//! - [`Stub`]: a partial item (title + url) produced by list parsing
//! - [`DetailFields`]: best-effort fields extracted from one detail payload
//! - [`NewsItem`]: the normalized record persisted by the sink
//! - [`NewsCategory`] / [`Source`]: the classification enums carried on
//!   every record

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// News type classification for a harvested item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    /// Trending/hot-list news.
    Hot,
    /// Latest domestic (China) news.
    LatestChina,
    /// Latest international news.
    LatestInternational,
}

impl NewsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Hot => "hot",
            NewsCategory::LatestChina => "latest_china",
            NewsCategory::LatestInternational => "latest_international",
        }
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Originating platform of a harvested item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Sina,
    Tencent,
    Netease,
    Cctv,
    Toutiao,
    Baidu,
    ThePaper,
    Zhihu,
    Weibo,
    FengHuang,
    Sztv,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Sina => "sina",
            Source::Tencent => "tencent",
            Source::Netease => "netease",
            Source::Cctv => "cctv",
            Source::Toutiao => "toutiao",
            Source::Baidu => "baidu",
            Source::ThePaper => "the_paper",
            Source::Zhihu => "zhihu",
            Source::Weibo => "weibo",
            Source::FengHuang => "feng_huang",
            Source::Sztv => "sztv",
        }
    }

    /// Parse a source identifier as given on the command line.
    pub fn parse(s: &str) -> Option<Source> {
        match s {
            "sina" => Some(Source::Sina),
            "tencent" => Some(Source::Tencent),
            "netease" => Some(Source::Netease),
            "cctv" => Some(Source::Cctv),
            "toutiao" => Some(Source::Toutiao),
            "baidu" => Some(Source::Baidu),
            "the_paper" => Some(Source::ThePaper),
            "zhihu" => Some(Source::Zhihu),
            "weibo" => Some(Source::Weibo),
            "feng_huang" => Some(Source::FengHuang),
            "sztv" => Some(Source::Sztv),
            _ => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A partial item produced by list parsing, pending detail enrichment.
///
/// Stubs are created per pipeline run and discarded after enrichment; they
/// are never persisted directly. A stub without both a title and a url is
/// dropped at parse time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stub {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source-specific extras carried from the list payload.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

impl Stub {
    /// Whether this stub carries the two fields required for acceptance.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// Best-effort fields extracted from one detail payload.
///
/// Absent fields are `None`/empty, never an error; detail extraction does
/// not discover the url (it is attached from the stub).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailFields {
    pub title: Option<String>,
    pub author: Option<String>,
    pub publish_time: Option<String>,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub meta: BTreeMap<String, String>,
}

/// One harvested news record.
///
/// `url` is the natural identifier: two fetches of the same url collapse to
/// one logical record (the relational sink upserts by it, the file sink
/// rewrites the whole per-source snapshot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Raw publish-time string in whatever format the source uses; parsed
    /// into a structured timestamp only at the relational sink.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
    pub category: NewsCategory,
    pub source: Source,
}

impl NewsItem {
    /// Build an item from a list stub alone, for sources whose list entries
    /// are already complete.
    pub fn from_stub(stub: Stub, category: NewsCategory, source: Source) -> Self {
        NewsItem {
            url: stub.url,
            title: stub.title,
            description: stub.description,
            author: None,
            publish_time: None,
            content: None,
            images: Vec::new(),
            meta: stub.meta,
            category,
            source,
        }
    }

    /// Media/outlet name, derived from source extras when present.
    pub fn media_name(&self) -> Option<&str> {
        self.meta
            .get("media_name")
            .or_else(|| self.meta.get("mediaid"))
            .map(String::as_str)
    }

    /// Short intro text: the list description, falling back to a
    /// source-provided meta description.
    pub fn intro(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| self.meta.get("description").map(String::as_str))
    }
}
