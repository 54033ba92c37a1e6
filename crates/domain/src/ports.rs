//! 外部协作方端口
//!
//! 投递网关负责把消息放上外部线路；内部路由把消息直接投进
//! 托管身份的收件箱，完全绕过外部网关。

use async_trait::async_trait;

use courier_core::CourierResult;

/// 一封待发出的邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from_address: String,
    pub to_addresses: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl OutboundEmail {
    pub fn new(from_address: String, to_addresses: Vec<String>, subject: String, html_body: String) -> Self {
        Self {
            from_address,
            to_addresses,
            subject,
            html_body,
            text_body: None,
            headers: Vec::new(),
        }
    }
}

/// 投递网关
///
/// 成功返回外部确认ID；提供方拒绝时返回Transport错误，
/// 本设计不做自动重试，由操作员触发重新入队。
#[async_trait]
pub trait TransportGateway: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> CourierResult<String>;
}

/// 内部路由
///
/// 当收件人本身就是托管发信身份时直接投递入收件箱，
/// 既省成本也避免内部测试流量泄露到外部提供方。
#[async_trait]
pub trait InternalRouter: Send + Sync {
    async fn deliver(&self, recipient_address: &str, email: &OutboundEmail) -> CourierResult<()>;
}
