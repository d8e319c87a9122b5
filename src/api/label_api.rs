// ==========================================
// 食品表示引擎 - 表示生成 API
// ==========================================
// 职责: 异步入口,负责超时、取消、并发生成与结果持久化
// 红线: 引擎在阻塞线程池中执行,不占用异步运行时线程
// 红线: 超时后取消标记生效,调用方不会收到部分结果
// ==========================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::sink::LabelResultSink;
use crate::config::EngineConfig;
use crate::domain::composition::CompositionNode;
use crate::domain::label::LabelResult;
use crate::domain::types::{NodeKey, NodeKind};
use crate::engine::cancel::CancellationToken;
use crate::engine::orchestrator::LabelOrchestrator;
use crate::engine::sources::LabelSources;

/// 待计算的根节点
enum Root {
    Stored(NodeKey),
    Draft(CompositionNode),
}

// ==========================================
// LabelApi - 表示生成 API
// ==========================================

/// 表示生成API
///
/// 职责:
/// 1. 按 (类型, ID) 生成表示并保存
/// 2. 多个根节点并发生成
/// 3. 未保存配合的预览
pub struct LabelApi {
    orchestrator: Arc<LabelOrchestrator>,
    sources: LabelSources,
    sink: Arc<dyn LabelResultSink>,
    timeout: Duration,
}

impl LabelApi {
    /// 创建新的LabelApi实例
    ///
    /// # 返回
    /// - Err(InvalidInput): 配置校验失败
    pub fn new(
        config: EngineConfig,
        sources: LabelSources,
        sink: Arc<dyn LabelResultSink>,
    ) -> ApiResult<Self> {
        config.validate()?;
        Ok(Self {
            timeout: Duration::from_millis(config.request_timeout_ms),
            orchestrator: Arc::new(LabelOrchestrator::new(config)),
            sources,
            sink,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        self.orchestrator.config()
    }

    /// 生成表示并保存
    ///
    /// # 参数
    /// - kind: 根节点类型
    /// - id: 根节点ID
    ///
    /// # 返回
    /// - Ok(LabelResult): 已保存的结果
    /// - Err(ApiError): 结构错误/缺失引用/超时/保存失败
    pub async fn generate_label(&self, kind: NodeKind, id: i64) -> ApiResult<LabelResult> {
        if id <= 0 {
            return Err(ApiError::InvalidInput(format!("节点ID必须为正数: {}", id)));
        }
        let key = NodeKey::new(kind, id);
        info!(root = %key, "收到表示生成请求");

        let result = self.compute(Root::Stored(key)).await?;

        if let Err(e) = self.sink.persist(&result).await {
            warn!(root = %key, result_id = %result.result_id, error = %e, "表示结果保存失败");
            return Err(e.into());
        }

        info!(root = %key, result_id = %result.result_id, "表示生成完成并已保存");
        Ok(result)
    }

    /// 并发生成多个根节点的表示
    ///
    /// 每个根节点使用独立的取消标记与记忆化缓存;返回顺序与输入一致
    pub async fn generate_labels(&self, roots: &[NodeKey]) -> Vec<ApiResult<LabelResult>> {
        info!(root_count = roots.len(), "收到批量表示生成请求");
        join_all(roots.iter().map(|key| self.generate_label(key.kind, key.id))).await
    }

    /// 预览: 对未保存的配合计算表示,不持久化
    pub async fn preview_label(&self, root: CompositionNode) -> ApiResult<LabelResult> {
        info!(root = %root.key(), "收到表示预览请求");
        self.compute(Root::Draft(root)).await
    }

    /// 在阻塞线程池中执行编排器,并施加超时
    async fn compute(&self, root: Root) -> ApiResult<LabelResult> {
        let token = CancellationToken::new();
        let orchestrator = self.orchestrator.clone();
        let sources = self.sources.clone();
        let worker_token = token.clone();

        let handle = tokio::task::spawn_blocking(move || match root {
            Root::Stored(key) => orchestrator.generate_for(key, &sources, &worker_token),
            Root::Draft(node) => orchestrator.generate(&node, &sources, &worker_token),
        });

        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(outcome)) => outcome.map_err(ApiError::from),
            Ok(Err(join_error)) => Err(ApiError::InternalError(format!(
                "计算任务异常终止: {}",
                join_error
            ))),
            Err(_) => {
                token.cancel();
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(timeout_ms, "表示生成超时,已取消");
                Err(ApiError::Timeout { timeout_ms })
            }
        }
    }
}
