// ==========================================
// 食品表示引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 配合展开 → 营养成分/添加物/过敏原汇总 → 表示文生成
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 汇总规则
pub mod engine;

// 配置层 - 引擎配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/表结构）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 异步业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CollectiveName, ComponentKind, ExemptionType, NodeKey, NodeKind, PurposeCategory, QualityFlag,
};

// 领域实体
pub use domain::{
    AdditiveInfo, AdditiveSummary, AdditiveUsage, AllergenFlags, AllergenItem, AllergenSummary,
    CompositionLink, CompositionNode, InputMode, LabelResult, LeafContribution, NutrientCode,
    NutrientVector,
};

// 引擎
pub use engine::{
    AdditiveAggregator, AllergenAggregator, CancellationToken, EngineError, LabelOrchestrator,
    LabelSources, RollupEngine,
};

// 配置
pub use config::{ConfigManager, EngineConfig};

// API
pub use api::{ApiError, ApiResult, LabelApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "食品表示引擎";
