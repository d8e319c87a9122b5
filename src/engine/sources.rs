// ==========================================
// 食品表示引擎 - 引擎层数据源聚合
// ==========================================
// 职责: 聚合表示生成所需的全部协作者
// 目标: 编排器与 API 只持有一个参数,便于整体替换为内存实现
// ==========================================

use crate::engine::collaborators::{
    AdditiveCatalog, AdditiveLookup, AllergenLookup, ChildResolver, NodeSource,
};
use std::sync::Arc;

/// 表示生成数据源集合
///
/// # 包含的协作者
/// - `nodes`: 根节点读取
/// - `children`: 子项解析
/// - `additives`: 原材料 → 添加物使用
/// - `allergens`: 原材料 → 过敏原标记
/// - `catalog`: 添加物目录
#[derive(Clone)]
pub struct LabelSources {
    pub nodes: Arc<dyn NodeSource>,
    pub children: Arc<dyn ChildResolver>,
    pub additives: Arc<dyn AdditiveLookup>,
    pub allergens: Arc<dyn AllergenLookup>,
    pub catalog: Arc<dyn AdditiveCatalog>,
}

impl LabelSources {
    pub fn new(
        nodes: Arc<dyn NodeSource>,
        children: Arc<dyn ChildResolver>,
        additives: Arc<dyn AdditiveLookup>,
        allergens: Arc<dyn AllergenLookup>,
        catalog: Arc<dyn AdditiveCatalog>,
    ) -> Self {
        Self {
            nodes,
            children,
            additives,
            allergens,
            catalog,
        }
    }

    /// 由同时实现全部 trait 的单一存储构造 (内存存储等)
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: NodeSource + ChildResolver + AdditiveLookup + AllergenLookup + AdditiveCatalog + 'static,
    {
        Self {
            nodes: store.clone(),
            children: store.clone(),
            additives: store.clone(),
            allergens: store.clone(),
            catalog: store,
        }
    }
}
