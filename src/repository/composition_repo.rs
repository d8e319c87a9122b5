// ==========================================
// 食品表示引擎 - 配合结构仓储
// ==========================================
// 职责: composition_node / composition_link / raw_material_nutrient 的读写
// 红线: Repository 不含业务逻辑,配合是否有效由引擎判定
// ==========================================

use crate::domain::composition::{CompositionLink, CompositionNode, InputMode, NodeBody};
use crate::domain::nutrient::{NutrientCode, NutrientValue, NutrientVector};
use crate::domain::types::{ComponentKind, NodeKey, NodeKind, QualityFlag};
use crate::engine::collaborators::{ChildResolver, LookupResult, NodeSource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// CompositionRepository - 配合结构仓储
// ==========================================
pub struct CompositionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompositionRepository {
    /// 创建新的 CompositionRepository 实例
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

    /// 保存节点 (覆盖已有的配合行/营养成分)
    pub fn save_node(&self, node: &CompositionNode) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let input_mode = match &node.body {
            NodeBody::Composite { input_mode, .. } => *input_mode,
            NodeBody::Leaf { .. } => InputMode::default(),
        };

        tx.execute(
            r#"
            INSERT INTO composition_node (kind, id, name, input_mode)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(kind, id) DO UPDATE SET name = ?3, input_mode = ?4
            "#,
            params![node.kind.as_str(), node.id, node.name, input_mode.as_str()],
        )?;

        match &node.body {
            NodeBody::Leaf { nutrients } => {
                tx.execute(
                    "DELETE FROM raw_material_nutrient WHERE raw_material_id = ?1",
                    params![node.id],
                )?;
                for (code, value) in nutrients.iter() {
                    tx.execute(
                        r#"
                        INSERT INTO raw_material_nutrient (raw_material_id, nutrient_code, value, quality)
                        VALUES (?1, ?2, ?3, ?4)
                        "#,
                        params![node.id, code.key(), value.value, value.quality.map(|q| q.as_str())],
                    )?;
                }
            }
            NodeBody::Composite { links, .. } => {
                tx.execute(
                    "DELETE FROM composition_link WHERE parent_kind = ?1 AND parent_id = ?2",
                    params![node.kind.as_str(), node.id],
                )?;
                for (seq, link) in links.iter().enumerate() {
                    tx.execute(
                        r#"
                        INSERT INTO composition_link (
                            parent_kind, parent_id, seq_no,
                            raw_material_id, pre_product_id,
                            mixing_ratio, weight, cost
                        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                        "#,
                        params![
                            node.kind.as_str(),
                            node.id,
                            seq as i64 + 1,
                            link.raw_material_id,
                            link.pre_product_id,
                            link.mixing_ratio,
                            link.weight,
                            link.cost,
                        ],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 按主键查询节点
    ///
    /// # 返回
    /// - Ok(Some(CompositionNode)): 找到
    /// - Ok(None): 未找到
    /// - Err: 数据库错误或字段值无法解析
    pub fn find_node(&self, kind: NodeKind, id: i64) -> RepositoryResult<Option<CompositionNode>> {
        let conn = self.get_conn()?;

        let row = conn
            .query_row(
                "SELECT name, input_mode FROM composition_node WHERE kind = ?1 AND id = ?2",
                params![kind.as_str(), id],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let (name, input_mode_raw) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let body = if kind.is_composite() {
            let input_mode: InputMode = input_mode_raw
                .parse()
                .map_err(|e: String| RepositoryError::field("input_mode", e))?;
            NodeBody::Composite {
                input_mode,
                links: Self::load_links(&conn, kind, id)?,
            }
        } else {
            NodeBody::Leaf {
                nutrients: Self::load_nutrients(&conn, id)?,
            }
        };

        Ok(Some(CompositionNode {
            id,
            kind,
            name,
            body,
        }))
    }

    /// 删除节点 (配合行随外键级联删除)
    pub fn delete_node(&self, key: NodeKey) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM composition_node WHERE kind = ?1 AND id = ?2",
            params![key.kind.as_str(), key.id],
        )?;
        if key.kind == NodeKind::RawMaterial {
            conn.execute(
                "DELETE FROM raw_material_nutrient WHERE raw_material_id = ?1",
                params![key.id],
            )?;
        }
        Ok(affected > 0)
    }

    /// 原材料是否存在
    pub fn raw_material_exists(&self, id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        Self::exists(&conn, NodeKind::RawMaterial, id)
    }

    pub(crate) fn exists(conn: &Connection, kind: NodeKind, id: i64) -> RepositoryResult<bool> {
        let found = conn
            .query_row(
                "SELECT 1 FROM composition_node WHERE kind = ?1 AND id = ?2",
                params![kind.as_str(), id],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    fn load_links(
        conn: &Connection,
        kind: NodeKind,
        id: i64,
    ) -> RepositoryResult<Vec<CompositionLink>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT raw_material_id, pre_product_id, mixing_ratio, weight, cost
            FROM composition_link
            WHERE parent_kind = ?1 AND parent_id = ?2
            ORDER BY seq_no
            "#,
        )?;

        let links = stmt
            .query_map(params![kind.as_str(), id], |row| {
                Ok(CompositionLink {
                    raw_material_id: row.get(0)?,
                    pre_product_id: row.get(1)?,
                    mixing_ratio: row.get(2)?,
                    weight: row.get(3)?,
                    cost: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn load_nutrients(conn: &Connection, raw_material_id: i64) -> RepositoryResult<NutrientVector> {
        let mut stmt = conn.prepare(
            r#"
            SELECT nutrient_code, value, quality
            FROM raw_material_nutrient
            WHERE raw_material_id = ?1
            "#,
        )?;

        let rows = stmt
            .query_map(params![raw_material_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut nutrients = NutrientVector::new();
        for (code_raw, value, quality_raw) in rows {
            let code = NutrientCode::from_key(&code_raw).ok_or_else(|| {
                RepositoryError::field("nutrient_code", format!("未知营养成分: {}", code_raw))
            })?;
            let quality = quality_raw
                .map(|q| q.parse::<QualityFlag>())
                .transpose()
                .map_err(|e| RepositoryError::field("quality", e))?;
            nutrients.set(code, NutrientValue { value, quality });
        }
        Ok(nutrients)
    }
}

// ==========================================
// 协作者 Trait 实现
// ==========================================

impl NodeSource for CompositionRepository {
    fn load_node(&self, kind: NodeKind, id: i64) -> LookupResult<CompositionNode> {
        Ok(self.find_node(kind, id)?)
    }
}

impl ChildResolver for CompositionRepository {
    fn resolve(&self, kind: ComponentKind, id: i64) -> LookupResult<CompositionNode> {
        Ok(self.find_node(kind.node_kind(), id)?)
    }
}
