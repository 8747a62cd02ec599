//! Feishu group-robot notifications.
//!
//! Two layouts: a rich-text post listing numbered hyperlinked titles, and
//! an interactive card that groups items with divider lines and an
//! optional "more" button. The layout is a configuration choice.

use crate::config::FeishuConfig;
use crate::models::NewsItem;
use crate::notify::{post_message, signed_url, NotifyError};
use chrono::Utc;
use serde_json::{json, Value};

pub struct FeishuNotifier {
    webhook_url: String,
    secret: Option<String>,
    card: bool,
    group_size: usize,
    more_url: Option<String>,
    client: reqwest::Client,
}

impl FeishuNotifier {
    pub fn new(config: &FeishuConfig) -> Self {
        FeishuNotifier {
            webhook_url: config.webhook_url.clone(),
            secret: config.secret.clone(),
            card: config.card,
            group_size: config.group_size.max(1),
            more_url: config.more_url.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Post the configured digest layout for this batch.
    pub async fn send_digest(&self, batch: &[NewsItem], title: &str) -> Result<(), NotifyError> {
        let message = if self.card {
            card_message(batch, title, self.group_size, self.more_url.as_deref())
        } else {
            post_digest_message(batch, title)
        };
        // Seconds-resolution timestamp for Feishu signing.
        let timestamp = Utc::now().timestamp().to_string();
        let url = signed_url(&self.webhook_url, self.secret.as_deref(), &timestamp);
        post_message(&self.client, &url, &message).await
    }
}

/// Rich-text post: a headline block followed by one numbered link per item.
pub(crate) fn post_digest_message(batch: &[NewsItem], title: &str) -> Value {
    let mut blocks = vec![vec![json!({"tag": "text", "text": format!("🚀 {title}")})]];
    for (index, item) in batch.iter().enumerate() {
        blocks.push(vec![json!({
            "tag": "a",
            "text": format!("{}. {}", index + 1, item.title),
            "href": item.url,
        })]);
    }
    json!({
        "msg_type": "post",
        "content": {
            "post": {
                "zh_cn": {
                    "title": title,
                    "content": blocks,
                }
            }
        }
    })
}

/// Interactive card: items in groups of `group_size` separated by divider
/// lines, with an optional "more" button at the bottom.
pub(crate) fn card_message(
    batch: &[NewsItem],
    title: &str,
    group_size: usize,
    more_url: Option<&str>,
) -> Value {
    let mut elements = vec![json!({"tag": "hr"})];
    for (group_index, group) in batch.chunks(group_size).enumerate() {
        if group_index > 0 {
            elements.push(json!({"tag": "hr"}));
        }
        for (offset, item) in group.iter().enumerate() {
            let number = group_index * group_size + offset + 1;
            let mut line = format!("{}. [{}]({})", number, item.title, item.url);
            if let Some(description) = &item.description {
                line.push_str(&format!("\n   *{description}*"));
            }
            elements.push(json!({
                "tag": "div",
                "text": {"tag": "lark_md", "content": line},
            }));
        }
    }
    if let Some(more) = more_url {
        elements.push(json!({"tag": "hr"}));
        elements.push(json!({
            "tag": "action",
            "actions": [{
                "tag": "button",
                "text": {"tag": "plain_text", "content": "查看更多新闻"},
                "type": "primary",
                "url": more,
            }],
        }));
    }
    json!({
        "msg_type": "interactive",
        "card": {
            "config": {"wide_screen_mode": true, "enable_forward": true},
            "header": {
                "title": {"tag": "plain_text", "content": title},
                "template": "wathet",
            },
            "elements": elements,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewsCategory, Source, Stub};

    fn batch(n: usize) -> Vec<NewsItem> {
        (1..=n)
            .map(|i| {
                NewsItem::from_stub(
                    Stub {
                        title: format!("headline {i}"),
                        url: format!("https://news.test/{i}"),
                        ..Default::default()
                    },
                    NewsCategory::Hot,
                    Source::Sina,
                )
            })
            .collect()
    }

    #[test]
    fn test_post_digest_shape() {
        let message = post_digest_message(&batch(3), "sina hot digest");
        assert_eq!(message["msg_type"], "post");
        let blocks = message["content"]["post"]["zh_cn"]["content"]
            .as_array()
            .unwrap();
        // Headline block plus one block per item.
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1][0]["tag"], "a");
        assert_eq!(blocks[1][0]["text"], "1. headline 1");
        assert_eq!(blocks[3][0]["href"], "https://news.test/3");
    }

    #[test]
    fn test_card_groups_and_more_button() {
        let message = card_message(&batch(7), "digest", 5, Some("https://news.baidu.com"));
        assert_eq!(message["msg_type"], "interactive");
        let elements = message["card"]["elements"].as_array().unwrap();
        // leading hr + 7 items + group divider + trailing hr + action
        assert_eq!(elements.len(), 11);
        let dividers = elements.iter().filter(|e| e["tag"] == "hr").count();
        assert_eq!(dividers, 3);
        assert_eq!(elements.last().unwrap()["tag"], "action");
    }

    #[test]
    fn test_card_without_more_button() {
        let message = card_message(&batch(2), "digest", 5, None);
        let elements = message["card"]["elements"].as_array().unwrap();
        assert!(elements.iter().all(|e| e["tag"] != "action"));
    }

    #[test]
    fn test_card_numbering_spans_groups() {
        let message = card_message(&batch(6), "digest", 5, None);
        let elements = message["card"]["elements"].as_array().unwrap();
        let texts: Vec<&str> = elements
            .iter()
            .filter(|e| e["tag"] == "div")
            .map(|e| e["text"]["content"].as_str().unwrap())
            .collect();
        assert!(texts[5].starts_with("6. "));
    }
}
