//! Harvest orchestration.
//!
//! One [`HarvestPipeline::run`] walks a single source/category pair through
//! the whole flow: fetch the list payload, parse it into stubs, fan out
//! concurrent detail fetches (bounded by the configured concurrency),
//! aggregate the survivors, then hand the batch to the sink and the
//! notifier — which run independently of each other and never fail the run.
//!
//! Failure posture, stage by stage:
//! - unsupported news type: the run is skipped with a warning and marked so
//! - list fetch failure: the run ends with zero items (logged, not a crash)
//! - a failing detail task drops only its own item, never the batch
//! - persistence and notification failures are logged by their owners

use crate::extract::{DetailExtract, Extractor};
use crate::fetch::{Fetch, FetchRequest};
use crate::models::{DetailFields, NewsCategory, NewsItem, Source, Stub};
use crate::notify::Notifier;
use crate::sink::Sink;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Outcome of one harvest run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Stubs produced by list parsing (after dedup by url).
    pub indexed: usize,
    /// Items that survived detail enrichment.
    pub harvested: usize,
    /// Stubs whose detail task produced nothing.
    pub failed: usize,
    /// True when the source declined the requested news type.
    pub skipped: bool,
}

impl RunSummary {
    fn skipped() -> Self {
        RunSummary {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Orchestrates one source's harvest runs.
pub struct HarvestPipeline<F: Fetch> {
    fetcher: Arc<F>,
    extractor: Arc<dyn Extractor>,
    sink: Sink,
    notifier: Notifier,
    concurrency: usize,
}

impl<F: Fetch> HarvestPipeline<F> {
    pub fn new(
        fetcher: Arc<F>,
        extractor: Arc<dyn Extractor>,
        sink: Sink,
        notifier: Notifier,
        concurrency: usize,
    ) -> Self {
        HarvestPipeline {
            fetcher,
            extractor,
            sink,
            notifier,
            concurrency: concurrency.max(1),
        }
    }

    /// Run one harvest for `category`.
    #[instrument(level = "info", skip(self), fields(source = %self.extractor.source(), %category))]
    pub async fn run(&self, category: NewsCategory) -> RunSummary {
        let source = self.extractor.source();

        let Some(list_request) = self.extractor.list_request(category) else {
            warn!("news type not supported by this source; skipping run");
            return RunSummary::skipped();
        };

        info!(url = %list_request.url, "fetching list");
        let payload = match self.fetcher.fetch(list_request).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "list fetch failed; run ends with no items");
                return RunSummary::default();
            }
        };

        let stubs: Vec<Stub> = self
            .extractor
            .parse_list(category, &payload)
            .into_iter()
            .unique_by(|stub| stub.url.clone())
            .collect();
        let indexed = stubs.len();
        if indexed == 0 {
            warn!(
                payload_preview = %crate::utils::truncate_for_log(&payload, 200),
                "list parsed to zero stubs"
            );
        }
        info!(count = indexed, "parsed list stubs");

        let batch: Vec<NewsItem> = match self.extractor.detail() {
            Some(detail) => self.enrich_all(stubs, detail, category, source).await,
            None => {
                debug!("source has no detail concept; list entries are complete");
                stubs
                    .into_iter()
                    .map(|stub| NewsItem::from_stub(stub, category, source))
                    .collect()
            }
        };

        let harvested = batch.len();
        let failed = indexed - harvested;
        info!(indexed, harvested, failed, "aggregated batch");

        let title = format!("{} {} digest", source, category);
        tokio::join!(
            self.sink.persist(&batch, source),
            self.notifier.notify(&batch, &title),
        );

        info!(harvested, "run completed");
        RunSummary {
            indexed,
            harvested,
            failed,
            skipped: false,
        }
    }

    /// Concurrent detail enrichment, bounded by the configured concurrency.
    /// A task that produced no payload maps to `None` and is dropped from
    /// the aggregate.
    async fn enrich_all(
        &self,
        stubs: Vec<Stub>,
        detail: &dyn DetailExtract,
        category: NewsCategory,
        source: Source,
    ) -> Vec<NewsItem> {
        let results: Vec<Option<NewsItem>> = stream::iter(stubs)
            .map(|stub| self.enrich_one(stub, detail, category, source))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        results.into_iter().flatten().collect()
    }

    async fn enrich_one(
        &self,
        stub: Stub,
        detail: &dyn DetailExtract,
        category: NewsCategory,
        source: Source,
    ) -> Option<NewsItem> {
        let mut request = FetchRequest::get(stub.url.as_str());
        request.rendered = detail.rendered();

        match self.fetcher.fetch(request).await {
            Ok(payload) => {
                let fields = detail.parse_detail(&payload);
                debug!(url = %stub.url, "enriched detail");
                Some(apply_detail(stub, fields, detail.kept_fields(), category, source))
            }
            Err(e) => {
                warn!(url = %stub.url, error = %e, "detail fetch failed; dropping item");
                None
            }
        }
    }
}

/// Merge detail fields into a stub under the source's allow-list
/// projection. The url always comes from the stub; detail extraction never
/// discovers it.
fn apply_detail(
    stub: Stub,
    fields: DetailFields,
    kept: &[&str],
    category: NewsCategory,
    source: Source,
) -> NewsItem {
    let mut item = NewsItem::from_stub(stub, category, source);
    let keep = |name: &str| kept.contains(&name);

    if keep("title") {
        if let Some(title) = fields.title.filter(|t| !t.trim().is_empty()) {
            item.title = title;
        }
    }
    if keep("author") {
        item.author = fields.author;
    }
    if keep("publish_time") {
        item.publish_time = fields.publish_time;
    }
    if keep("content") {
        item.content = fields.content;
    }
    if keep("images") {
        item.images = fields.images;
    }
    // Detail extras never clobber what the list already provided.
    for (key, value) in fields.meta {
        item.meta.entry(key).or_insert(value);
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap, HashSet};

    const LIST_URL: &str = "https://news.test/list";

    /// Canned fetcher: url -> body, with a set of urls that always fail.
    struct MockFetch {
        bodies: HashMap<String, String>,
        failing: HashSet<String>,
    }

    #[async_trait]
    impl Fetch for MockFetch {
        async fn fetch(&self, req: FetchRequest) -> Result<String, FetchError> {
            if self.failing.contains(&req.url) {
                return Err(FetchError::Status { code: 504 });
            }
            self.bodies
                .get(&req.url)
                .cloned()
                .ok_or(FetchError::Status { code: 404 })
        }
    }

    /// List payloads are newline-separated `title|url` pairs; detail
    /// payloads are `author|content` pairs.
    struct MockExtractor {
        with_detail: bool,
        supports_hot_only: bool,
    }

    struct MockDetail;

    impl DetailExtract for MockDetail {
        fn parse_detail(&self, raw: &str) -> DetailFields {
            let (author, content) = raw.split_once('|').unwrap_or(("", raw));
            DetailFields {
                author: (!author.is_empty()).then(|| author.to_string()),
                content: Some(content.to_string()),
                ..Default::default()
            }
        }

        fn kept_fields(&self) -> &[&str] {
            &["content"]
        }
    }

    static MOCK_DETAIL: MockDetail = MockDetail;

    impl Extractor for MockExtractor {
        fn source(&self) -> Source {
            Source::Sina
        }

        fn list_request(&self, category: NewsCategory) -> Option<FetchRequest> {
            if self.supports_hot_only && category != NewsCategory::Hot {
                return None;
            }
            Some(FetchRequest::get(LIST_URL))
        }

        fn parse_list(&self, _category: NewsCategory, raw: &str) -> Vec<Stub> {
            raw.lines()
                .filter_map(|line| line.split_once('|'))
                .map(|(title, url)| Stub {
                    title: title.to_string(),
                    url: url.to_string(),
                    ..Default::default()
                })
                .filter(Stub::is_complete)
                .collect()
        }

        fn detail(&self) -> Option<&dyn DetailExtract> {
            self.with_detail.then_some(&MOCK_DETAIL as &dyn DetailExtract)
        }
    }

    fn pipeline(
        bodies: HashMap<String, String>,
        failing: HashSet<String>,
        with_detail: bool,
    ) -> HarvestPipeline<MockFetch> {
        HarvestPipeline::new(
            Arc::new(MockFetch { bodies, failing }),
            Arc::new(MockExtractor {
                with_detail,
                supports_hot_only: true,
            }),
            Sink::disabled(),
            Notifier::disabled(),
            4,
        )
    }

    fn list_body() -> String {
        "A|https://news.test/a\nB|https://news.test/b\nC|https://news.test/c".to_string()
    }

    #[tokio::test]
    async fn test_partial_failure_tolerance() {
        let mut bodies = HashMap::new();
        bodies.insert(LIST_URL.to_string(), list_body());
        bodies.insert("https://news.test/a".to_string(), "x|body A".to_string());
        bodies.insert("https://news.test/c".to_string(), "y|body C".to_string());
        let failing = HashSet::from(["https://news.test/b".to_string()]);

        let summary = pipeline(bodies, failing, true).run(NewsCategory::Hot).await;
        assert_eq!(summary.indexed, 3);
        assert_eq!(summary.harvested, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.skipped);
    }

    #[tokio::test]
    async fn test_list_fetch_failure_ends_run_empty() {
        let failing = HashSet::from([LIST_URL.to_string()]);
        let summary = pipeline(HashMap::new(), failing, true)
            .run(NewsCategory::Hot)
            .await;
        assert_eq!(summary, RunSummary::default());
    }

    #[tokio::test]
    async fn test_unsupported_news_type_is_reported_skip() {
        let summary = pipeline(HashMap::new(), HashSet::new(), true)
            .run(NewsCategory::LatestChina)
            .await;
        assert!(summary.skipped);
        assert_eq!(summary.harvested, 0);
    }

    #[tokio::test]
    async fn test_source_without_detail_passes_stubs_through() {
        let mut bodies = HashMap::new();
        bodies.insert(LIST_URL.to_string(), list_body());
        let summary = pipeline(bodies, HashSet::new(), false)
            .run(NewsCategory::Hot)
            .await;
        assert_eq!(summary.indexed, 3);
        assert_eq!(summary.harvested, 3);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_duplicate_urls_collapse() {
        let mut bodies = HashMap::new();
        bodies.insert(
            LIST_URL.to_string(),
            "A|https://news.test/a\nA again|https://news.test/a".to_string(),
        );
        let summary = pipeline(bodies, HashSet::new(), false)
            .run(NewsCategory::Hot)
            .await;
        assert_eq!(summary.indexed, 1);
    }

    #[test]
    fn test_apply_detail_projection_and_url_ownership() {
        let stub = Stub {
            title: "list title".into(),
            url: "https://news.test/a".into(),
            description: Some("intro".into()),
            meta: BTreeMap::new(),
        };
        let fields = DetailFields {
            title: Some("detail title".into()),
            author: Some("somebody".into()),
            content: Some("body".into()),
            ..Default::default()
        };
        // Only content is on the allow-list.
        let item = apply_detail(
            stub,
            fields,
            &["content"],
            NewsCategory::Hot,
            Source::Sina,
        );
        assert_eq!(item.url, "https://news.test/a");
        assert_eq!(item.title, "list title");
        assert_eq!(item.author, None);
        assert_eq!(item.content.as_deref(), Some("body"));
        assert_eq!(item.description.as_deref(), Some("intro"));
    }

    #[test]
    fn test_apply_detail_keeps_stub_title_when_detail_blank() {
        let stub = Stub {
            title: "list title".into(),
            url: "https://news.test/a".into(),
            ..Default::default()
        };
        let fields = DetailFields {
            title: Some("   ".into()),
            ..Default::default()
        };
        let item = apply_detail(
            stub,
            fields,
            &["title", "content"],
            NewsCategory::Hot,
            Source::Sina,
        );
        assert_eq!(item.title, "list title");
    }
}
