// ==========================================
// 食品表示引擎 - 引擎层外部协作者接口
// ==========================================
// 职责: 定义引擎读取配合/添加物/过敏原数据所需的 trait,实现依赖倒置
// 说明: Engine 层定义 trait, Repository 层 (SQLite) 与内存存储实现
// 红线: 引擎不重试;协作者的瞬时失败立即以 LookupError 返回
// ==========================================

use crate::domain::additive::{AdditiveInfo, AdditiveUsage};
use crate::domain::allergen::AllergenFlags;
use crate::domain::composition::{CompositionNode, NodeBody};
use crate::domain::types::{ComponentKind, NodeKey, NodeKind};
use std::collections::HashMap;
use thiserror::Error;

// ==========================================
// 协作者错误
// ==========================================

/// 协作者读取失败 (非"未找到")
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("数据源不可用: {0}")]
    Unavailable(String),

    #[error("数据源错误: {0}")]
    Backend(String),
}

/// Result 类型别名
///
/// - `Ok(Some(_))`: 找到
/// - `Ok(None)`: 未找到 (由引擎转换为 MissingReference)
/// - `Err(_)`: 读取失败
pub type LookupResult<T> = Result<Option<T>, LookupError>;

// ==========================================
// 协作者 Trait
// ==========================================

/// 子项解析器: (类型, ID) → 配合节点
pub trait ChildResolver: Send + Sync {
    fn resolve(&self, kind: ComponentKind, id: i64) -> LookupResult<CompositionNode>;
}

/// 根节点读取: 任意类型 (含半製品) 的节点
pub trait NodeSource: Send + Sync {
    fn load_node(&self, kind: NodeKind, id: i64) -> LookupResult<CompositionNode>;
}

/// 原材料上的添加物使用
pub trait AdditiveLookup: Send + Sync {
    fn additives_for(&self, raw_material_id: i64) -> LookupResult<Vec<AdditiveUsage>>;

    /// 批量读取
    ///
    /// 默认逐个调用 `additives_for`;实现方可覆写为一次查询。
    /// 返回的 map 中缺失的 ID 视为"未找到"。
    fn additives_for_many(
        &self,
        raw_material_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<AdditiveUsage>>, LookupError> {
        let mut result = HashMap::with_capacity(raw_material_ids.len());
        for id in raw_material_ids {
            if let Some(usages) = self.additives_for(*id)? {
                result.insert(*id, usages);
            }
        }
        Ok(result)
    }
}

/// 原材料上的过敏原标记
pub trait AllergenLookup: Send + Sync {
    fn allergens_for(&self, raw_material_id: i64) -> LookupResult<AllergenFlags>;

    /// 批量读取 (语义同 `AdditiveLookup::additives_for_many`)
    fn allergens_for_many(
        &self,
        raw_material_ids: &[i64],
    ) -> Result<HashMap<i64, AllergenFlags>, LookupError> {
        let mut result = HashMap::with_capacity(raw_material_ids.len());
        for id in raw_material_ids {
            if let Some(flags) = self.allergens_for(*id)? {
                result.insert(*id, flags);
            }
        }
        Ok(result)
    }
}

/// 添加物目录
pub trait AdditiveCatalog: Send + Sync {
    fn lookup(&self, additive_id: i64) -> LookupResult<AdditiveInfo>;
}

// ==========================================
// InMemoryCompositionStore - 内存实现
// ==========================================
// 用于测试、CLI 演示,以及调用方已持有全部数据的场景

#[derive(Debug, Clone, Default)]
pub struct InMemoryCompositionStore {
    nodes: HashMap<NodeKey, CompositionNode>,
    additives: HashMap<i64, AdditiveInfo>,
    usages: HashMap<i64, Vec<AdditiveUsage>>,
    allergens: HashMap<i64, AllergenFlags>,
}

impl InMemoryCompositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记节点;原材料同时登记空的添加物/过敏原数据
    pub fn insert_node(&mut self, node: CompositionNode) -> &mut Self {
        if matches!(node.body, NodeBody::Leaf { .. }) {
            self.usages.entry(node.id).or_default();
            self.allergens.entry(node.id).or_default();
        }
        self.nodes.insert(node.key(), node);
        self
    }

    pub fn insert_additive(&mut self, info: AdditiveInfo) -> &mut Self {
        self.additives.insert(info.additive_id, info);
        self
    }

    pub fn insert_usage(&mut self, raw_material_id: i64, usage: AdditiveUsage) -> &mut Self {
        self.usages.entry(raw_material_id).or_default().push(usage);
        self
    }

    pub fn set_allergens(&mut self, raw_material_id: i64, flags: AllergenFlags) -> &mut Self {
        self.allergens.insert(raw_material_id, flags);
        self
    }

    /// 移除节点 (仅节点本身,用于构造缺失引用场景)
    pub fn remove_node(&mut self, key: NodeKey) -> Option<CompositionNode> {
        self.nodes.remove(&key)
    }

    pub fn node(&self, key: NodeKey) -> Option<&CompositionNode> {
        self.nodes.get(&key)
    }
}

impl ChildResolver for InMemoryCompositionStore {
    fn resolve(&self, kind: ComponentKind, id: i64) -> LookupResult<CompositionNode> {
        Ok(self.nodes.get(&NodeKey::new(kind.node_kind(), id)).cloned())
    }
}

impl NodeSource for InMemoryCompositionStore {
    fn load_node(&self, kind: NodeKind, id: i64) -> LookupResult<CompositionNode> {
        Ok(self.nodes.get(&NodeKey::new(kind, id)).cloned())
    }
}

impl AdditiveLookup for InMemoryCompositionStore {
    fn additives_for(&self, raw_material_id: i64) -> LookupResult<Vec<AdditiveUsage>> {
        Ok(self.usages.get(&raw_material_id).cloned())
    }
}

impl AllergenLookup for InMemoryCompositionStore {
    fn allergens_for(&self, raw_material_id: i64) -> LookupResult<AllergenFlags> {
        Ok(self.allergens.get(&raw_material_id).copied())
    }
}

impl AdditiveCatalog for InMemoryCompositionStore {
    fn lookup(&self, additive_id: i64) -> LookupResult<AdditiveInfo> {
        Ok(self.additives.get(&additive_id).cloned())
    }
}
