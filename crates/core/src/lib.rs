//! courier-core
//!
//! 基础层: 统一错误类型、应用配置、模板渲染。
//! 不依赖任何其他courier crate。

pub mod config;
pub mod errors;
pub mod template;

pub use config::AppConfig;
pub use errors::{CourierError, CourierResult};
