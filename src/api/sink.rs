// ==========================================
// 食品表示引擎 - 结果持久化接口
// ==========================================
// 职责: 定义生成结果的异步持久化 trait,实现依赖倒置
// 说明: API 层定义 trait, Repository 层 (LabelResultRepository) 实现
// ==========================================

use crate::domain::label::LabelResult;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use tracing::debug;

/// 表示结果持久化
#[async_trait]
pub trait LabelResultSink: Send + Sync {
    /// 保存一次生成结果
    ///
    /// # 返回
    /// - Ok(()): 保存成功
    /// - Err: 保存失败 (结果已生成,但调用方会收到错误)
    async fn persist(&self, result: &LabelResult) -> RepositoryResult<()>;
}

/// 空实现: 不保存任何结果
pub struct NoOpLabelSink;

#[async_trait]
impl LabelResultSink for NoOpLabelSink {
    async fn persist(&self, result: &LabelResult) -> RepositoryResult<()> {
        debug!(result_id = %result.result_id, "NoOpLabelSink: 跳过结果保存");
        Ok(())
    }
}
