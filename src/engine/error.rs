// ==========================================
// 食品表示引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 错误仅作用于单次展开,不影响后续调用
// ==========================================

use crate::domain::types::{NodeKey, NodeKind};
use crate::engine::collaborators::LookupError;
use std::fmt;
use thiserror::Error;

/// 触发的规模限制类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    Depth,     // 递归深度
    NodeCount, // 访问节点数
}

impl fmt::Display for GuardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardKind::Depth => write!(f, "最大深度"),
            GuardKind::NodeCount => write!(f, "最大节点数"),
        }
    }
}

/// 缺失引用的实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    RawMaterial,
    PreProduct,
    SemiFinishedProduct,
    Additive,
    AllergenFlags,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::RawMaterial => write!(f, "原材料"),
            ReferenceKind::PreProduct => write!(f, "仕掛品"),
            ReferenceKind::SemiFinishedProduct => write!(f, "半製品"),
            ReferenceKind::Additive => write!(f, "添加物"),
            ReferenceKind::AllergenFlags => write!(f, "过敏原标记"),
        }
    }
}

impl From<NodeKind> for ReferenceKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::RawMaterial => ReferenceKind::RawMaterial,
            NodeKind::PreProduct => ReferenceKind::PreProduct,
            NodeKind::SemiFinishedProduct => ReferenceKind::SemiFinishedProduct,
        }
    }
}

/// 以 `a -> b -> a` 形式输出循环路径
fn format_path(path: &[NodeKey]) -> String {
    path.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 结构错误 =====
    #[error("配合循环引用: {}", format_path(.path))]
    CompositionCycle { path: Vec<NodeKey> },

    #[error("配合规模超限: 超过{guard}={limit} (节点 {node})")]
    CompositionTooLarge {
        guard: GuardKind,
        limit: usize,
        node: NodeKey,
    },

    #[error("无效配合 (节点 {node}): {reason}")]
    InvalidComposition { node: NodeKey, reason: String },

    // ===== 数据引用错误 =====
    #[error("引用不存在: {entity} id={id}")]
    MissingReference { entity: ReferenceKind, id: i64 },

    // ===== 执行控制 =====
    #[error("计算已取消")]
    Cancelled,

    #[error("外部数据读取失败: {0}")]
    Lookup(#[from] LookupError),
}

impl EngineError {
    pub fn invalid(node: NodeKey, reason: impl Into<String>) -> Self {
        EngineError::InvalidComposition {
            node,
            reason: reason.into(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
