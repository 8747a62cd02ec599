//! DingTalk group-robot notifications.
//!
//! One layout: a markdown message whose body is a numbered list of
//! hyperlinked titles. DingTalk signing uses a millisecond timestamp.

use crate::config::DingTalkConfig;
use crate::models::NewsItem;
use crate::notify::{post_message, signed_url, NotifyError};
use chrono::Utc;
use serde_json::{json, Value};

pub struct DingTalkNotifier {
    webhook_url: String,
    secret: Option<String>,
    client: reqwest::Client,
}

impl DingTalkNotifier {
    pub fn new(config: &DingTalkConfig) -> Self {
        DingTalkNotifier {
            webhook_url: config.webhook_url.clone(),
            secret: config.secret.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn send_digest(&self, batch: &[NewsItem], title: &str) -> Result<(), NotifyError> {
        let message = markdown_message(batch, title);
        let timestamp = Utc::now().timestamp_millis().to_string();
        let url = signed_url(&self.webhook_url, self.secret.as_deref(), &timestamp);
        post_message(&self.client, &url, &message).await
    }
}

pub(crate) fn markdown_message(batch: &[NewsItem], title: &str) -> Value {
    let mut text = format!("# 🚀 {title}\n\n");
    for (index, item) in batch.iter().enumerate() {
        text.push_str(&format!("{}. [{}]({})\n\n", index + 1, item.title, item.url));
    }
    json!({
        "msgtype": "markdown",
        "markdown": {"title": title, "text": text},
    })
}
