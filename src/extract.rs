//! The per-source extraction contract.
//!
//! Each source implements [`Extractor`]: it names the list request for a
//! news category (or declines the category), parses the raw list payload
//! into stubs, and optionally exposes a [`DetailExtract`] for detail-page
//! enrichment. Capabilities are checked by the pipeline before invocation —
//! a source that does not support a news type returns `None` from
//! [`Extractor::list_request`] and the run is skipped with a warning, and a
//! source whose list entries are already complete returns `None` from
//! [`Extractor::detail`].
//!
//! Parsing is tolerant by contract: malformed list payloads yield an empty
//! stub list and malformed detail payloads yield whatever fields could be
//! extracted. Parse failures never cross this boundary as errors.

use crate::fetch::FetchRequest;
use crate::models::{DetailFields, NewsCategory, Source, Stub};
use regex::Regex;
use tracing::warn;

/// Detail-page extraction capability of a source.
pub trait DetailExtract: Send + Sync {
    /// Extract best-effort fields from a raw detail payload.
    fn parse_detail(&self, raw: &str) -> DetailFields;

    /// Allow-list of fields this source declares meaningful; everything
    /// else extracted from the detail page is discarded.
    fn kept_fields(&self) -> &[&str] {
        &["title", "author", "publish_time", "content", "images"]
    }

    /// Whether detail pages require the rendered-fetch path.
    fn rendered(&self) -> bool {
        false
    }
}

/// One source's extraction rules.
pub trait Extractor: Send + Sync {
    /// The platform this extractor handles.
    fn source(&self) -> Source;

    /// The list request for a news category, or `None` when the source does
    /// not support that category.
    fn list_request(&self, category: NewsCategory) -> Option<FetchRequest>;

    /// Parse a raw list payload into stubs. Stubs lacking a title or url
    /// are dropped here; malformed input yields an empty list.
    fn parse_list(&self, category: NewsCategory, raw: &str) -> Vec<Stub>;

    /// Detail enrichment capability, `None` when list entries are already
    /// complete.
    fn detail(&self) -> Option<&dyn DetailExtract> {
        None
    }
}

/// Unwrap a JSONP/script envelope: apply `re` to `raw` and parse capture
/// group 1 as JSON. Returns `None` (with a warning) when the envelope or
/// the JSON inside it is malformed.
pub fn jsonp_payload(re: &Regex, raw: &str) -> Option<serde_json::Value> {
    let captured = match re.captures(raw) {
        Some(caps) => caps.get(1)?.as_str(),
        None => {
            warn!("no JSON payload found in JSONP envelope");
            return None;
        }
    };
    match serde_json::from_str(captured) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "JSONP payload is not valid JSON");
            None
        }
    }
}
