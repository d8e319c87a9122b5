// ==========================================
// 食品表示引擎 - API 层
// ==========================================
// 职责: 提供异步业务 API,供 CLI 或上层服务调用
// ==========================================

pub mod error;
pub mod label_api;
pub mod sink;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use label_api::LabelApi;
pub use sink::{LabelResultSink, NoOpLabelSink};
