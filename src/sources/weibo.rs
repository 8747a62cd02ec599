//! Weibo hot-search extractor.
//!
//! Hot-search entries carry everything there is to know (a phrase and its
//! link) — there is no detail page to enrich from, so this source has no
//! detail capability and list entries pass straight through the pipeline.

use crate::extract::Extractor;
use crate::fetch::FetchRequest;
use crate::models::{NewsCategory, Source, Stub};
use tracing::warn;

const HOT_URL: &str = "https://m.weibo.cn/api/container/getIndex";

pub struct WeiboExtractor;

impl Extractor for WeiboExtractor {
    fn source(&self) -> Source {
        Source::Weibo
    }

    fn list_request(&self, category: NewsCategory) -> Option<FetchRequest> {
        match category {
            NewsCategory::Hot => Some(FetchRequest::get(HOT_URL).with_params(vec![
                (
                    "containerid".into(),
                    "106003type=25&t=3&disable_hot=1&filter_type=realtimehot".into(),
                ),
                ("luicode".into(), "20000061".into()),
                ("lfid".into(), "5070140584495876".into()),
            ])),
            _ => None,
        }
    }

    fn parse_list(&self, _category: NewsCategory, raw: &str) -> Vec<Stub> {
        let payload: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "hot search payload is not valid JSON");
                return Vec::new();
            }
        };
        let Some(entries) = payload["data"]["cards"]
            .get(0)
            .and_then(|card| card["card_group"].as_array())
        else {
            warn!("hot search payload has no card group");
            return Vec::new();
        };
        entries
            .iter()
            .map(|entry| Stub {
                // Hot-search items label the phrase `desc` and its link
                // `scheme`.
                title: entry["desc"].as_str().unwrap_or_default().to_string(),
                url: entry["scheme"].as_str().unwrap_or_default().to_string(),
                ..Default::default()
            })
            .filter(Stub::is_complete)
            .collect()
    }
}
