// ==========================================
// 食品表示引擎 - 引擎层
// ==========================================
// 职责: 配合展开、添加物/过敏原汇总、表示文生成
// 红线: Engine 不拼 SQL,数据访问全部经由协作者 trait
// 红线: 引擎无跨请求状态,并发请求无需加锁
// ==========================================

pub mod additive_aggregator;
pub mod allergen_aggregator;
pub mod cancel;
pub mod collaborators;
pub mod error;
pub mod label_formatter;
pub mod orchestrator;
pub mod rollup;
pub mod sources;

// 重导出核心引擎
pub use additive_aggregator::AdditiveAggregator;
pub use allergen_aggregator::AllergenAggregator;
pub use cancel::CancellationToken;
pub use collaborators::{
    AdditiveCatalog, AdditiveLookup, AllergenLookup, ChildResolver, InMemoryCompositionStore,
    LookupError, LookupResult, NodeSource,
};
pub use error::{EngineError, EngineResult, GuardKind, ReferenceKind};
pub use label_formatter::{
    additive_display_name, allergen_statement, format_additive_display, format_allergen_display,
    format_nutrition_facts, render_additive, AllergenDisplayPolicy,
};
pub use orchestrator::LabelOrchestrator;
pub use rollup::{RollupEngine, RollupOutput, RollupStats};
pub use sources::LabelSources;
