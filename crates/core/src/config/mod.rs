//! 应用配置
//!
//! 加载顺序: 内置默认值 -> TOML配置文件 -> 环境变量覆盖(前缀 COURIER_)

mod models;

use std::path::Path;

use anyhow::Context;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub use models::{DatabaseConfig, JobsConfig, TransportConfig};

/// 系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jobs: JobsConfig,
    pub transport: TransportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/courier".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_seconds: 30,
                idle_timeout_seconds: 600,
            },
            jobs: JobsConfig {
                deferred_interval_seconds: 60,
                sequence_interval_seconds: 300,
                campaign_interval_seconds: 120,
            },
            transport: TransportConfig {
                api_url: "https://mail-provider.invalid/v1/send".to_string(),
                api_key: String::new(),
                request_timeout_seconds: 30,
            },
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("database.url", defaults.database.url.clone())?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connection_timeout_seconds",
                defaults.database.connection_timeout_seconds,
            )?
            .set_default(
                "database.idle_timeout_seconds",
                defaults.database.idle_timeout_seconds,
            )?
            .set_default(
                "jobs.deferred_interval_seconds",
                defaults.jobs.deferred_interval_seconds,
            )?
            .set_default(
                "jobs.sequence_interval_seconds",
                defaults.jobs.sequence_interval_seconds,
            )?
            .set_default(
                "jobs.campaign_interval_seconds",
                defaults.jobs.campaign_interval_seconds,
            )?
            .set_default("transport.api_url", defaults.transport.api_url.clone())?
            .set_default("transport.api_key", defaults.transport.api_key.clone())?
            .set_default(
                "transport.request_timeout_seconds",
                defaults.transport.request_timeout_seconds,
            )?;

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else {
            let default_paths = ["config/courier.toml", "courier.toml", "/etc/courier/config.toml"];
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    break;
                }
            }
        }

        let config = builder
            .add_source(Environment::with_prefix("COURIER").separator("__"))
            .build()
            .context("构建配置失败")?;

        let app_config: AppConfig = config.try_deserialize().context("解析配置失败")?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// 校验所有配置段
    pub fn validate(&self) -> anyhow::Result<()> {
        self.database.validate().context("数据库配置无效")?;
        self.jobs.validate().context("作业配置无效")?;
        self.transport.validate().context("投递网关配置无效")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_job_intervals() {
        let config = AppConfig::default();
        assert_eq!(config.jobs.deferred_interval_seconds, 60);
        assert_eq!(config.jobs.sequence_interval_seconds, 300);
        assert_eq!(config.jobs.campaign_interval_seconds, 120);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = AppConfig::default();
        config.jobs.campaign_interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_connections_exceeding_max_rejected() {
        let mut config = AppConfig::default();
        config.database.min_connections = 50;
        config.database.max_connections = 10;
        assert!(config.validate().is_err());
    }
}
