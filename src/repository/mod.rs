// ==========================================
// 食品表示引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供 SQLite 版本的协作者实现,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod additive_repo;
pub mod allergen_repo;
pub mod composition_repo;
pub mod error;
pub mod label_result_repo;

// 重导出核心仓储
pub use additive_repo::AdditiveRepository;
pub use allergen_repo::AllergenRepository;
pub use composition_repo::CompositionRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use label_result_repo::LabelResultRepository;

use crate::engine::sources::LabelSources;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 基于同一连接构造全部 SQLite 数据源
pub fn sqlite_label_sources(conn: Arc<Mutex<Connection>>) -> LabelSources {
    let compositions = Arc::new(CompositionRepository::from_connection(conn.clone()));
    let additives = Arc::new(AdditiveRepository::from_connection(conn.clone()));
    let allergens = Arc::new(AllergenRepository::from_connection(conn));
    LabelSources::new(
        compositions.clone(),
        compositions,
        additives.clone(),
        allergens,
        additives,
    )
}
