// ==========================================
// 食品表示引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、静态目录
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod additive;
pub mod allergen;
pub mod composition;
pub mod label;
pub mod nutrient;
pub mod types;

// 重导出核心类型
pub use additive::{AdditiveInfo, AdditiveSummary, AdditiveUsage, MergedAdditive};
pub use allergen::{
    AllergenCatalog, AllergenCatalogEntry, AllergenFlags, AllergenItem, AllergenSummary,
    MergedAllergen, ALLERGEN_SLOT_COUNT,
};
pub use composition::{
    merge_leaves, CompositionLink, CompositionNode, InputMode, LeafContribution, NodeBody,
};
pub use label::LabelResult;
pub use nutrient::{NutrientCode, NutrientValue, NutrientVector};
pub use types::{
    CollectiveName, ComponentKind, ExemptionType, NodeKey, NodeKind, PurposeCategory,
    QualityFlag,
};
