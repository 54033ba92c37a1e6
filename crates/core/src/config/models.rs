use serde::{Deserialize, Serialize};

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.url.is_empty() {
            return Err(anyhow::anyhow!("数据库URL不能为空"));
        }

        if self.max_connections == 0 {
            return Err(anyhow::anyhow!("最大连接数必须大于0"));
        }

        if self.min_connections > self.max_connections {
            return Err(anyhow::anyhow!(
                "最小连接数({})不能大于最大连接数({})",
                self.min_connections,
                self.max_connections
            ));
        }

        Ok(())
    }
}

/// 定时作业配置
///
/// 三类作业各自独立轮询：一次性延迟发送、序列推进、营销活动分发。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub deferred_interval_seconds: u64,
    pub sequence_interval_seconds: u64,
    pub campaign_interval_seconds: u64,
}

impl JobsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.deferred_interval_seconds == 0 {
            return Err(anyhow::anyhow!("延迟发送轮询间隔必须大于0"));
        }

        if self.sequence_interval_seconds == 0 {
            return Err(anyhow::anyhow!("序列轮询间隔必须大于0"));
        }

        if self.campaign_interval_seconds == 0 {
            return Err(anyhow::anyhow!("营销活动轮询间隔必须大于0"));
        }

        Ok(())
    }
}

/// 投递网关配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub api_url: String,
    pub api_key: String,
    pub request_timeout_seconds: u64,
}

impl TransportConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("投递网关URL不能为空"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("投递网关超时时间必须大于0"));
        }

        Ok(())
    }
}
