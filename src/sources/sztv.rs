//! SZTV (Shenzhen TV) news extractor.
//!
//! The news portal assembles its list client-side, so both the list page
//! and article pages go through the rendered-fetch path. Relative hrefs in
//! the list are resolved against the portal base. Only the hot list is
//! available; the latest-domestic feed is declined.

use super::ArticleDetail;
use crate::extract::{DetailExtract, Extractor};
use crate::fetch::FetchRequest;
use crate::models::{NewsCategory, Source, Stub};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

const NEWS_URL: &str = "https://www.sztv.com.cn/news/";

static ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.news-list-more-list div.item_article").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("div.item_text").unwrap());

pub struct SztvExtractor {
    detail: ArticleDetail,
}

impl SztvExtractor {
    pub fn new() -> Self {
        SztvExtractor {
            detail: ArticleDetail::new(
                &["title", "author", "publish_time", "content", "images"],
                true,
            ),
        }
    }
}

impl Extractor for SztvExtractor {
    fn source(&self) -> Source {
        Source::Sztv
    }

    fn list_request(&self, category: NewsCategory) -> Option<FetchRequest> {
        match category {
            NewsCategory::Hot => Some(FetchRequest::get(NEWS_URL).rendered()),
            _ => None,
        }
    }

    fn parse_list(&self, _category: NewsCategory, raw: &str) -> Vec<Stub> {
        let document = Html::parse_document(raw);
        let base = Url::parse(NEWS_URL).ok();

        let mut stubs = Vec::new();
        for item in document.select(&ITEM) {
            let Some(href) = item
                .select(&LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };
            let Some(title_el) = item.select(&TITLE).next() else {
                continue;
            };
            let title = title_el
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string();

            let url = match &base {
                Some(base) => base
                    .join(href)
                    .map(|resolved| resolved.to_string())
                    .unwrap_or_default(),
                None => href.to_string(),
            };

            let stub = Stub {
                title,
                url,
                ..Default::default()
            };
            if stub.is_complete() {
                stubs.push(stub);
            }
        }
        stubs
    }

    fn detail(&self) -> Option<&dyn DetailExtract> {
        Some(&self.detail)
    }
}
