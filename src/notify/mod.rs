//! Webhook notification dispatch.
//!
//! Formats a harvested batch into channel-specific digests and posts them
//! to Feishu and/or DingTalk group robots. Notification is strictly
//! best-effort: a delivery failure is logged and never propagated, and a
//! disabled channel performs zero network operations.
//!
//! # Signing
//!
//! Robots with the "sign" security setting verify an HMAC-SHA256 signature
//! computed over `"{timestamp}\n{secret}"`, base64-encoded and appended as
//! `timestamp`/`sign` query parameters. Feishu timestamps are in seconds,
//! DingTalk in milliseconds.

pub mod dingtalk;
pub mod feishu;

use crate::config::Config;
use crate::models::NewsItem;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

type HmacSha256 = Hmac<Sha256>;

/// A classified notification failure.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook returned status {code}")]
    Status { code: u16 },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Append `timestamp` and `sign` query parameters to a webhook URL.
/// Without a secret the URL passes through unchanged.
pub(crate) fn signed_url(webhook: &str, secret: Option<&str>, timestamp: &str) -> String {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return webhook.to_string();
    };
    let string_to_sign = format!("{timestamp}\n{secret}");
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    let sign = STANDARD.encode(mac.finalize().into_bytes());
    let separator = if webhook.contains('?') { '&' } else { '?' };
    format!(
        "{webhook}{separator}timestamp={timestamp}&sign={}",
        urlencoding::encode(&sign)
    )
}

/// POST a JSON message to a (possibly signed) webhook URL.
pub(crate) async fn post_message(
    client: &reqwest::Client,
    url: &str,
    message: &serde_json::Value,
) -> Result<(), NotifyError> {
    let response = client.post(url).json(message).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(NotifyError::Status {
            code: status.as_u16(),
        });
    }
    Ok(())
}

/// Facade over the enabled notification channels.
pub struct Notifier {
    feishu: Option<feishu::FeishuNotifier>,
    dingtalk: Option<dingtalk::DingTalkNotifier>,
}

impl Notifier {
    /// A notifier with every channel off; `notify` is a no-op.
    pub fn disabled() -> Self {
        Notifier {
            feishu: None,
            dingtalk: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let feishu = (config.feishu.enabled && !config.feishu.webhook_url.is_empty())
            .then(|| feishu::FeishuNotifier::new(&config.feishu));
        let dingtalk = (config.dingtalk.enabled && !config.dingtalk.webhook_url.is_empty())
            .then(|| dingtalk::DingTalkNotifier::new(&config.dingtalk));
        Notifier { feishu, dingtalk }
    }

    /// Post the batch digest to every enabled channel. Channels do not
    /// block each other and a failure in one leaves the other untouched.
    #[instrument(level = "info", skip_all, fields(count = batch.len()))]
    pub async fn notify(&self, batch: &[NewsItem], title: &str) {
        if self.feishu.is_none() && self.dingtalk.is_none() {
            debug!("notifier disabled; skipping dispatch");
            return;
        }
        if batch.is_empty() {
            debug!("empty batch; nothing to notify");
            return;
        }

        tokio::join!(
            async {
                if let Some(feishu) = &self.feishu {
                    match feishu.send_digest(batch, title).await {
                        Ok(()) => info!(channel = "feishu", "notification sent"),
                        Err(e) => error!(channel = "feishu", error = %e, "notification failed"),
                    }
                }
            },
            async {
                if let Some(dingtalk) = &self.dingtalk {
                    match dingtalk.send_digest(batch, title).await {
                        Ok(()) => info!(channel = "dingtalk", "notification sent"),
                        Err(e) => error!(channel = "dingtalk", error = %e, "notification failed"),
                    }
                }
            },
        );
    }
}
