//! Sina news extractor.
//!
//! Both list endpoints answer with script/JSONP envelopes that need regex
//! unwrapping before the JSON inside can be parsed:
//! - hot list: `var all_1_data01 = {...};` from the top-news ranking
//! - domestic feed: `try{feedCardJsonpCallback({...});}catch(e){};`
//!
//! Detail pages are ordinary article HTML handled by the general
//! extraction heuristic.

use super::ArticleDetail;
use crate::extract::{jsonp_payload, DetailExtract, Extractor};
use crate::fetch::FetchRequest;
use crate::models::{NewsCategory, Source, Stub};
use crate::utils::{compact_date, millis_timestamp};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

const HOT_URL: &str = "https://top.news.sina.com.cn/ws/GetTopDataList.php";
const FEED_URL: &str = "https://feed.sina.com.cn/api/roll/get";

static HOT_ENVELOPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)var\s+all_1_data01\s*=\s*(\{.*?\});").unwrap());
static FEED_ENVELOPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)try\{feedCardJsonpCallback\((\{.*?\})\);\}catch\(e\)\{\};").unwrap());

pub struct SinaExtractor {
    detail: ArticleDetail,
}

impl SinaExtractor {
    pub fn new() -> Self {
        SinaExtractor {
            detail: ArticleDetail::new(
                &["title", "author", "publish_time", "content", "images"],
                false,
            ),
        }
    }

    fn parse_hot(&self, raw: &str) -> Vec<Stub> {
        let Some(payload) = jsonp_payload(&HOT_ENVELOPE, raw) else {
            return Vec::new();
        };
        let Some(entries) = payload["data"].as_array() else {
            warn!("hot payload has no data array");
            return Vec::new();
        };
        entries
            .iter()
            .map(|entry| {
                let mut stub = Stub {
                    title: text(&entry["title"]),
                    url: text(&entry["url"]),
                    ..Default::default()
                };
                if let Some(media) = entry["media"].as_str().filter(|s| !s.is_empty()) {
                    stub.meta.insert("media_name".to_string(), media.to_string());
                }
                if let Some(top) = entry["top_num"].as_str() {
                    stub.meta.insert("top_num".to_string(), top.to_string());
                }
                stub
            })
            .filter(Stub::is_complete)
            .collect()
    }

    fn parse_feed(&self, raw: &str) -> Vec<Stub> {
        let Some(payload) = jsonp_payload(&FEED_ENVELOPE, raw) else {
            return Vec::new();
        };
        let Some(entries) = payload["result"]["data"].as_array() else {
            warn!("feed payload has no result.data array");
            return Vec::new();
        };
        entries
            .iter()
            .map(|entry| {
                let mut stub = Stub {
                    title: text(&entry["title"]),
                    url: text(&entry["url"]),
                    description: entry["intro"]
                        .as_str()
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                    ..Default::default()
                };
                if let Some(media) = entry["media_name"].as_str().filter(|s| !s.is_empty()) {
                    stub.meta.insert("media_name".to_string(), media.to_string());
                }
                stub
            })
            .filter(Stub::is_complete)
            .collect()
    }
}

/// String field of a JSON value, empty when absent or non-string.
fn text(value: &serde_json::Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

impl Extractor for SinaExtractor {
    fn source(&self) -> Source {
        Source::Sina
    }

    fn list_request(&self, category: NewsCategory) -> Option<FetchRequest> {
        match category {
            NewsCategory::Hot => Some(FetchRequest::get(HOT_URL).with_params(vec![
                ("top_type".into(), "day".into()),
                ("top_cat".into(), "www_www_all_suda_suda".into()),
                ("top_time".into(), compact_date()),
                ("top_show_num".into(), "50".into()),
                ("top_order".into(), "DESC".into()),
                ("short_title".into(), "1".into()),
                ("js_var".into(), "all_1_data01".into()),
                ("_".into(), millis_timestamp()),
            ])),
            NewsCategory::LatestChina => Some(FetchRequest::get(FEED_URL).with_params(vec![
                ("pageid".into(), "121".into()),
                ("lid".into(), "1356".into()),
                ("num".into(), "20".into()),
                ("versionNumber".into(), "1.2.4".into()),
                ("page".into(), "1".into()),
                ("encode".into(), "utf-8".into()),
                ("callback".into(), "feedCardJsonpCallback".into()),
                ("_".into(), millis_timestamp()),
            ])),
            NewsCategory::LatestInternational => None,
        }
    }

    fn parse_list(&self, category: NewsCategory, raw: &str) -> Vec<Stub> {
        match category {
            NewsCategory::Hot => self.parse_hot(raw),
            NewsCategory::LatestChina => self.parse_feed(raw),
            NewsCategory::LatestInternational => Vec::new(),
        }
    }

    fn detail(&self) -> Option<&dyn DetailExtract> {
        Some(&self.detail)
    }
}
