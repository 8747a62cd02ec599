//! General-purpose article field extraction.
//!
//! Fallback extraction for detail pages with no stable selectors: metadata
//! comes from the usual `<meta>` tags and the body text from a
//! text-density pick — the container with the most paragraph text and the
//! least link text wins. Everything is best-effort; a page this module
//! cannot make sense of yields empty fields, never an error.

use crate::models::DetailFields;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());
static AUTHOR: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"meta[name="author"]"#).unwrap());
static DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static PUBLISHED: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"meta[property="article:published_time"], meta[name="publishdate"], meta[name="date"]"#,
    )
    .unwrap()
});
static TIME_TAG: Lazy<Selector> = Lazy::new(|| Selector::parse("time[datetime]").unwrap());
static CANDIDATES: Lazy<Selector> = Lazy::new(|| Selector::parse("article, div, section").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Minimum paragraph text (in bytes) for an element to be considered a
/// content container.
const MIN_CONTENT_LEN: usize = 100;

/// Extract best-effort article fields from raw HTML.
pub fn extract_article(html: &str) -> DetailFields {
    let doc = Html::parse_document(html);
    let mut fields = DetailFields {
        title: meta_content(&doc, &OG_TITLE)
            .or_else(|| first_text(&doc, &TITLE))
            .or_else(|| first_text(&doc, &H1)),
        author: meta_content(&doc, &AUTHOR),
        publish_time: meta_content(&doc, &PUBLISHED).or_else(|| time_datetime(&doc)),
        ..Default::default()
    };
    if let Some(description) = meta_content(&doc, &DESCRIPTION) {
        fields.meta.insert("description".to_string(), description);
    }

    if let Some(container) = pick_content_container(&doc) {
        fields.content = container_text(container);
        fields.images = container_images(container);
    }
    fields
}

fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .map(|el| squash(el))
        .find(|s| !s.is_empty())
}

fn time_datetime(doc: &Html) -> Option<String> {
    doc.select(&TIME_TAG)
        .filter_map(|el| el.value().attr("datetime"))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Whitespace-squashed text content of an element.
fn squash(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pick the container scoring highest on paragraph text density with a
/// penalty for link text (navigation, related-article blocks).
fn pick_content_container(doc: &Html) -> Option<ElementRef<'_>> {
    let mut best: Option<(ElementRef<'_>, f64)> = None;
    for el in doc.select(&CANDIDATES) {
        let paragraph_len: usize = el.select(&PARAGRAPH).map(|p| squash(p).len()).sum();
        if paragraph_len < MIN_CONTENT_LEN {
            continue;
        }
        let link_len: usize = el.select(&ANCHOR).map(|a| squash(a).len()).sum();
        let score = paragraph_len as f64 - 1.5 * link_len as f64;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((el, score));
        }
    }
    best.map(|(el, _)| el)
}

fn container_text(container: ElementRef<'_>) -> Option<String> {
    let paragraphs: Vec<String> = container
        .select(&PARAGRAPH)
        .map(squash)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        let text = squash(container);
        return (!text.is_empty()).then_some(text);
    }
    Some(paragraphs.join("\n"))
}

fn container_images(container: ElementRef<'_>) -> Vec<String> {
    let mut images = Vec::new();
    for img in container.select(&IMG) {
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .unwrap_or_default()
            .trim();
        let resolved = if src.starts_with("//") {
            format!("https:{src}")
        } else if src.starts_with("http") {
            src.to_string()
        } else {
            continue;
        };
        if !images.contains(&resolved) {
            images.push(resolved);
        }
    }
    images
}
