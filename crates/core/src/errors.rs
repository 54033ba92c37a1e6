use thiserror::Error;

/// 投递调度器统一错误类型
#[derive(Debug, Error)]
pub enum CourierError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("数据库操作错误: {0}")]
    DatabaseOperation(String),

    #[error("营销活动未找到: {id}")]
    CampaignNotFound { id: i64 },

    #[error("发信账户未找到: {id}")]
    SenderAccountNotFound { id: i64 },

    #[error("收件人筛选配置错误: {0}")]
    Targeting(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("投递网关错误: {0}")]
    Transport(String),

    #[error("模板渲染错误: {0}")]
    Template(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type CourierResult<T> = std::result::Result<T, CourierError>;
