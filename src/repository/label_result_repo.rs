// ==========================================
// 食品表示引擎 - 表示结果仓储
// ==========================================
// 职责: label_result 表的读写 (完整结果以 JSON 存储)
// 红线: 结果写入后不修改,同一根节点的多次生成各自保存
// ==========================================

use crate::api::sink::LabelResultSink;
use crate::domain::label::LabelResult;
use crate::domain::types::NodeKey;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::SecondsFormat;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// LabelResultRepository - 表示结果仓储
// ==========================================
pub struct LabelResultRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LabelResultRepository {
    /// 创建新的 LabelResultRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存结果
    pub fn insert(&self, result: &LabelResult) -> RepositoryResult<()> {
        let payload = serde_json::to_string(result)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO label_result (result_id, root_kind, root_id, payload_json, computed_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                result.result_id,
                result.root.kind.as_str(),
                result.root.id,
                payload,
                result.computed_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            ],
        )?;
        debug!(result_id = %result.result_id, root = %result.root, "表示结果已保存");
        Ok(())
    }

    /// 按结果ID查询
    pub fn find_by_id(&self, result_id: &str) -> RepositoryResult<Option<LabelResult>> {
        let conn = self.get_conn()?;
        let payload = conn
            .query_row(
                "SELECT payload_json FROM label_result WHERE result_id = ?1",
                params![result_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 查询根节点的全部结果 (按生成时间升序)
    pub fn list_by_root(&self, root: NodeKey) -> RepositoryResult<Vec<LabelResult>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT payload_json FROM label_result
            WHERE root_kind = ?1 AND root_id = ?2
            ORDER BY computed_at, rowid
            "#,
        )?;
        let payloads = stmt
            .query_map(params![root.kind.as_str(), root.id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut results = Vec::with_capacity(payloads.len());
        for json in payloads {
            results.push(serde_json::from_str(&json)?);
        }
        Ok(results)
    }

    /// 查询根节点最近一次的结果
    pub fn find_latest_by_root(&self, root: NodeKey) -> RepositoryResult<Option<LabelResult>> {
        Ok(self.list_by_root(root)?.pop())
    }
}

#[async_trait]
impl LabelResultSink for LabelResultRepository {
    async fn persist(&self, result: &LabelResult) -> RepositoryResult<()> {
        self.insert(result)
    }
}
