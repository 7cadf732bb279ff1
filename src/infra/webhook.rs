//! Webhook 通知客户端
//!
//! 尽力投递：任何传输错误或非 2xx 响应只记录日志，不影响部署周期。

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::env::constants::NOTIFY_TIMEOUT_SECS;
use crate::config::NotifyConfig;
use crate::error::NotifyError;

/// 通知接口，调用方永远看不到失败
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Slack 兼容的 incoming webhook
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    config: NotifyConfig,
}

impl WebhookNotifier {
    pub fn new(config: NotifyConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(NOTIFY_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, config })
    }

    /// 发送一次，不重试
    async fn post(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&WebhookPayload { text: message })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(status))
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) {
        if !self.config.is_active() {
            debug!("Notifications disabled, skipping");
            return;
        }

        if let Err(e) = self.post(message).await {
            // 消息本身以 `[branch]` 开头，失败时也要能看出是哪个环境
            warn!(error = %e, text = %message, "Slack post failed");
        }
    }
}
