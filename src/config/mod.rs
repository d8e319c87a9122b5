// ==========================================
// 食品表示引擎 - 配置层
// ==========================================
// 职责: 引擎配置定义、默认值、覆写读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod error;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::EngineConfig;
pub use error::{ConfigError, ConfigResult};
