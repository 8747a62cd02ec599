//! Tencent news extractor.
//!
//! The hot-module endpoint is a JSON API behind the body-bearing verb, so
//! list fetches go through the POST retry policy. Only the hot list is
//! available; the latest-domestic feed is declined. Detail pages keep no
//! author field — article bylines on this platform are unreliable.

use super::ArticleDetail;
use crate::extract::{DetailExtract, Extractor};
use crate::fetch::FetchRequest;
use crate::models::{NewsCategory, Source, Stub};
use serde_json::json;
use tracing::warn;

const HOT_URL: &str = "https://i.news.qq.com/web_feed/getHotModuleList";

pub struct TencentExtractor {
    detail: ArticleDetail,
}

impl TencentExtractor {
    pub fn new() -> Self {
        TencentExtractor {
            detail: ArticleDetail::new(&["title", "publish_time", "content", "images"], false),
        }
    }
}

impl Extractor for TencentExtractor {
    fn source(&self) -> Source {
        Source::Tencent
    }

    fn list_request(&self, category: NewsCategory) -> Option<FetchRequest> {
        match category {
            NewsCategory::Hot => Some(FetchRequest::post(
                HOT_URL,
                json!({
                    "base_req": {"from": "pc"},
                    "forward": "2",
                    "qimei36": "0_FpZFnxfEm2k23",
                    "device_id": "0_FpZFnxfEm2k23",
                    "flush_num": 1,
                    "channel_id": "news_news_top",
                    "item_count": 20,
                }),
            )),
            _ => None,
        }
    }

    fn parse_list(&self, _category: NewsCategory, raw: &str) -> Vec<Stub> {
        let payload: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "hot module payload is not valid JSON");
                return Vec::new();
            }
        };
        let Some(entries) = payload["data"].as_array() else {
            warn!("hot module payload has no data array");
            return Vec::new();
        };
        entries
            .iter()
            .map(|entry| Stub {
                title: entry["title"].as_str().unwrap_or_default().to_string(),
                url: entry["link_info"]["url"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string(),
                description: entry["intro"]
                    .as_str()
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                ..Default::default()
            })
            .filter(Stub::is_complete)
            .collect()
    }

    fn detail(&self) -> Option<&dyn DetailExtract> {
        Some(&self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::Method;

    const HOT_PAYLOAD: &str = r#"{"data":[
        {"title":"热榜一","link_info":{"url":"https://news.qq.com/rain/a/1"},"intro":"摘要"},
        {"title":"热榜二","link_info":{"url":"https://news.qq.com/rain/a/2"}},
        {"title":"无链接","link_info":{}}
    ]}"#;

    #[test]
    fn test_parse_hot_module_list() {
        let extractor = TencentExtractor::new();
        let stubs = extractor.parse_list(NewsCategory::Hot, HOT_PAYLOAD);
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].title, "热榜一");
        assert_eq!(stubs[0].url, "https://news.qq.com/rain/a/1");
        assert_eq!(stubs[0].description.as_deref(), Some("摘要"));
        assert!(stubs[1].description.is_none());
    }

    #[test]
    fn test_malformed_payload_yields_empty_list() {
        let extractor = TencentExtractor::new();
        assert!(extractor.parse_list(NewsCategory::Hot, "not json").is_empty());
        assert!(extractor
            .parse_list(NewsCategory::Hot, r#"{"data": "not a list"}"#)
            .is_empty());
    }

    #[test]
    fn test_list_is_post_and_latest_china_declined() {
        let extractor = TencentExtractor::new();
        let request = extractor.list_request(NewsCategory::Hot).unwrap();
        assert_eq!(request.method, Method::Post);
        assert!(request.body.is_some());
        assert!(extractor.list_request(NewsCategory::LatestChina).is_none());
    }

    #[test]
    fn test_author_not_in_allow_list() {
        let extractor = TencentExtractor::new();
        let kept = extractor.detail().unwrap().kept_fields();
        assert!(!kept.contains(&"author"));
        assert!(kept.contains(&"content"));
    }
}
