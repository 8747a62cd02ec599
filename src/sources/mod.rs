//! Per-source extractor implementations.
//!
//! Every source follows the same contract ([`crate::extract::Extractor`])
//! but differs in list payload shape and detail capability:
//!
//! | Source | Module | List payload | Detail |
//! |--------|--------|--------------|--------|
//! | Sina | [`sina`] | JSONP/script envelopes (hot + domestic feed) | article pages |
//! | Tencent | [`tencent`] | JSON endpoint (POST) | article pages |
//! | Weibo | [`weibo`] | JSON endpoint | none — list entries are complete |
//! | SZTV | [`sztv`] | rendered HTML | rendered article pages |

pub mod sina;
pub mod sztv;
pub mod tencent;
pub mod weibo;

use crate::article::extract_article;
use crate::extract::{DetailExtract, Extractor};
use crate::models::{DetailFields, Source};
use std::sync::Arc;

/// Sources with an implemented extractor.
pub const IMPLEMENTED: &[Source] = &[Source::Sina, Source::Tencent, Source::Weibo, Source::Sztv];

/// Look up the extractor for a source; `None` for platforms in the enum
/// without an implementation yet.
pub fn extractor_for(source: Source) -> Option<Arc<dyn Extractor>> {
    match source {
        Source::Sina => Some(Arc::new(sina::SinaExtractor::new())),
        Source::Tencent => Some(Arc::new(tencent::TencentExtractor::new())),
        Source::Weibo => Some(Arc::new(weibo::WeiboExtractor)),
        Source::Sztv => Some(Arc::new(sztv::SztvExtractor::new())),
        _ => None,
    }
}

/// Detail extraction through the general article heuristic, parameterized
/// by the source's field allow-list and fetch path.
pub(crate) struct ArticleDetail {
    kept: &'static [&'static str],
    rendered: bool,
}

impl ArticleDetail {
    pub(crate) fn new(kept: &'static [&'static str], rendered: bool) -> Self {
        ArticleDetail { kept, rendered }
    }
}

impl DetailExtract for ArticleDetail {
    fn parse_detail(&self, raw: &str) -> DetailFields {
        extract_article(raw)
    }

    fn kept_fields(&self) -> &[&str] {
        self.kept
    }

    fn rendered(&self) -> bool {
        self.rendered
    }
}
