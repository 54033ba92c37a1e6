//! # SQLx 数据库类型转换实现
//!
//! 状态枚举以SCREAMING_CASE字符串存储在VARCHAR列中。

use crate::entities::{
    CampaignStatus, DeferredStatus, EnrollmentStatus, RecipientSource, SendStatus,
};

// CampaignStatus SQLx 实现
impl sqlx::Type<sqlx::Postgres> for CampaignStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CampaignStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "DRAFT" => Ok(CampaignStatus::Draft),
            "SCHEDULED" => Ok(CampaignStatus::Scheduled),
            "SENDING" => Ok(CampaignStatus::Sending),
            "SENT" => Ok(CampaignStatus::Sent),
            _ => Err(format!("Invalid campaign status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for CampaignStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Scheduled => "SCHEDULED",
            CampaignStatus::Sending => "SENDING",
            CampaignStatus::Sent => "SENT",
        };
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(s, buf)
    }
}

// SendStatus SQLx 实现
impl sqlx::Type<sqlx::Postgres> for SendStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SendStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "PENDING" => Ok(SendStatus::Pending),
            "SENT" => Ok(SendStatus::Sent),
            "FAILED" => Ok(SendStatus::Failed),
            "BOUNCED" => Ok(SendStatus::Bounced),
            _ => Err(format!("Invalid send status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for SendStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = match self {
            SendStatus::Pending => "PENDING",
            SendStatus::Sent => "SENT",
            SendStatus::Failed => "FAILED",
            SendStatus::Bounced => "BOUNCED",
        };
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(s, buf)
    }
}

// RecipientSource SQLx 实现
impl sqlx::Type<sqlx::Postgres> for RecipientSource {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RecipientSource {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "DIRECTORY" => Ok(RecipientSource::Directory),
            "MANUAL" => Ok(RecipientSource::Manual),
            "PLATFORM" => Ok(RecipientSource::Platform),
            _ => Err(format!("Invalid recipient source: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for RecipientSource {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = match self {
            RecipientSource::Directory => "DIRECTORY",
            RecipientSource::Manual => "MANUAL",
            RecipientSource::Platform => "PLATFORM",
        };
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(s, buf)
    }
}

// EnrollmentStatus SQLx 实现
impl sqlx::Type<sqlx::Postgres> for EnrollmentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for EnrollmentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "ACTIVE" => Ok(EnrollmentStatus::Active),
            "COMPLETED" => Ok(EnrollmentStatus::Completed),
            "UNSUBSCRIBED" => Ok(EnrollmentStatus::Unsubscribed),
            "ERROR" => Ok(EnrollmentStatus::Error),
            _ => Err(format!("Invalid enrollment status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for EnrollmentStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = match self {
            EnrollmentStatus::Active => "ACTIVE",
            EnrollmentStatus::Completed => "COMPLETED",
            EnrollmentStatus::Unsubscribed => "UNSUBSCRIBED",
            EnrollmentStatus::Error => "ERROR",
        };
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(s, buf)
    }
}

// DeferredStatus SQLx 实现
impl sqlx::Type<sqlx::Postgres> for DeferredStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DeferredStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "PENDING" => Ok(DeferredStatus::Pending),
            "SENT" => Ok(DeferredStatus::Sent),
            _ => Err(format!("Invalid deferred status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for DeferredStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        let s = match self {
            DeferredStatus::Pending => "PENDING",
            DeferredStatus::Sent => "SENT",
        };
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(s, buf)
    }
}
