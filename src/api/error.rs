// ==========================================
// 食品表示引擎 - API层错误类型
// ==========================================
// 职责: 将引擎/仓储/配置错误转换为调用方可处理的分类
// 红线: 错误信息必须包含显式原因 (节点、上限、缺失实体)
// ==========================================

use crate::config::ConfigError;
use crate::engine::collaborators::LookupError;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 配合结构错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("配合循环引用: {0}")]
    CompositionCycle(String),

    #[error("配合规模超限: {0}")]
    CompositionTooLarge(String),

    // ==========================================
    // 执行控制错误
    // ==========================================
    #[error("计算已取消")]
    Cancelled,

    #[error("计算超时: 超过{timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据源不可用: {0}")]
    Unavailable(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            e @ EngineError::CompositionCycle { .. } => ApiError::CompositionCycle(detail(&e)),
            e @ EngineError::CompositionTooLarge { .. } => {
                ApiError::CompositionTooLarge(detail(&e))
            }
            e @ EngineError::InvalidComposition { .. } => ApiError::InvalidInput(e.to_string()),
            EngineError::MissingReference { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::Cancelled => ApiError::Cancelled,
            EngineError::Lookup(e) => ApiError::from(e),
        }
    }
}

/// 去掉引擎错误消息中的分类前缀 (`配合循环引用: ...` → `...`)
fn detail(err: &EngineError) -> String {
    let message = err.to_string();
    match message.split_once(": ") {
        Some((_, rest)) => rest.to_string(),
        None => message,
    }
}

// ==========================================
// 从 LookupError 转换
// ==========================================
impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Unavailable(msg) => ApiError::Unavailable(msg),
            LookupError::Backend(msg) => ApiError::DatabaseError(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::Unavailable(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::SerializationError(e) => ApiError::InternalError(e.to_string()),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            e @ (ConfigError::InvalidValue { .. } | ConfigError::Validation(_)) => {
                ApiError::InvalidInput(e.to_string())
            }
            ConfigError::Database(e) => ApiError::DatabaseError(e.to_string()),
            ConfigError::LockError(msg) => ApiError::Unavailable(msg),
            ConfigError::Serialization(e) => ApiError::InternalError(e.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
