// ==========================================
// 食品表示引擎 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 存储错误 =====
    #[error("配置读取失败: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("锁获取失败: {0}")]
    LockError(String),

    #[error("配置序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),

    // ===== 内容错误 =====
    #[error("配置值无效: {key}={value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("配置校验失败: {0}")]
    Validation(String),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
