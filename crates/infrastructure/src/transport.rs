use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use courier_core::config::TransportConfig;
use courier_core::{CourierError, CourierResult};
use courier_domain::ports::{OutboundEmail, TransportGateway};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    headers: Vec<(&'a str, &'a str)>,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// 邮件提供方HTTP API网关
pub struct HttpTransportGateway {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpTransportGateway {
    pub fn new(config: &TransportConfig) -> CourierResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| CourierError::Transport(format!("构建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl TransportGateway for HttpTransportGateway {
    async fn send(&self, email: &OutboundEmail) -> CourierResult<String> {
        let request = SendRequest {
            from: &email.from_address,
            to: &email.to_addresses,
            subject: &email.subject,
            html: &email.html_body,
            text: email.text_body.as_deref(),
            headers: email
                .headers
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CourierError::Transport(format!("请求投递网关失败: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CourierError::Transport(format!(
                "投递网关拒绝({status}): {body}"
            )));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| CourierError::Transport(format!("解析网关响应失败: {e}")))?;

        // 个别提供方不回传ID，本地补一个可追踪的确认ID
        let confirmation_id = parsed.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        debug!("投递网关确认: {confirmation_id}");

        Ok(confirmation_id)
    }
}
