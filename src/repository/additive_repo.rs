// ==========================================
// 食品表示引擎 - 添加物仓储
// ==========================================
// 职责: additive (目录) 与 raw_material_additive (使用) 的读写
// 红线: Repository 不含业务逻辑,合并与豁免判定由引擎完成
// ==========================================

use crate::domain::additive::{AdditiveInfo, AdditiveUsage};
use crate::domain::types::{ExemptionType, NodeKind, PurposeCategory};
use crate::engine::collaborators::{AdditiveCatalog, AdditiveLookup, LookupError, LookupResult};
use crate::repository::composition_repo::CompositionRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AdditiveRepository - 添加物仓储
// ==========================================
pub struct AdditiveRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AdditiveRepository {
    /// 创建新的 AdditiveRepository 实例
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

    // ===== 目录 =====

    /// 保存添加物目录条目 (UPSERT)
    pub fn save_additive(&self, info: &AdditiveInfo) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO additive (
                additive_id, substance_name, simplified_name,
                collective_name, purpose_category, requires_purpose_display
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(additive_id) DO UPDATE SET
                substance_name = ?2,
                simplified_name = ?3,
                collective_name = ?4,
                purpose_category = ?5,
                requires_purpose_display = ?6
            "#,
            params![
                info.additive_id,
                info.substance_name,
                info.simplified_name,
                info.collective_name,
                info.purpose_category.map(|p| p.as_str()),
                info.requires_purpose_display,
            ],
        )?;
        Ok(())
    }

    /// 按ID查询添加物目录条目
    pub fn find_additive(&self, additive_id: i64) -> RepositoryResult<Option<AdditiveInfo>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                r#"
                SELECT substance_name, simplified_name, collective_name,
                       purpose_category, requires_purpose_display
                FROM additive WHERE additive_id = ?1
                "#,
                params![additive_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, bool>(4)?,
                    ))
                },
            )
            .optional()?;

        let (substance_name, simplified_name, collective_name, purpose_raw, requires) = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let purpose_category = purpose_raw
            .map(|p| p.parse::<PurposeCategory>())
            .transpose()
            .map_err(|e| RepositoryError::field("purpose_category", e))?;

        Ok(Some(AdditiveInfo {
            additive_id,
            substance_name,
            simplified_name,
            collective_name,
            purpose_category,
            requires_purpose_display: requires,
        }))
    }

    // ===== 使用 =====

    /// 替换原材料的全部添加物使用
    pub fn replace_usages(
        &self,
        raw_material_id: i64,
        usages: &[AdditiveUsage],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM raw_material_additive WHERE raw_material_id = ?1",
            params![raw_material_id],
        )?;
        for (seq, usage) in usages.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO raw_material_additive (
                    raw_material_id, seq_no, additive_id,
                    usage_amount, exemption_type, allergen_origin
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    raw_material_id,
                    seq as i64 + 1,
                    usage.additive_id,
                    usage.usage_amount,
                    usage.exemption_type.as_str(),
                    usage.allergen_origin,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 查询原材料的添加物使用
    ///
    /// # 返回
    /// - Ok(Some(Vec)): 原材料存在 (可为空列表)
    /// - Ok(None): 原材料不存在
    pub fn find_usages(&self, raw_material_id: i64) -> RepositoryResult<Option<Vec<AdditiveUsage>>> {
        let conn = self.get_conn()?;
        if !CompositionRepository::exists(&conn, NodeKind::RawMaterial, raw_material_id)? {
            return Ok(None);
        }
        let mut by_material = Self::load_usages(&conn, &[raw_material_id])?;
        Ok(Some(by_material.remove(&raw_material_id).unwrap_or_default()))
    }

    /// 批量查询: 一次查询存在性,一次查询使用
    pub fn find_usages_many(
        &self,
        raw_material_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, Vec<AdditiveUsage>>> {
        if raw_material_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.get_conn()?;

        let existing = existing_raw_materials(&conn, raw_material_ids)?;
        let mut usages = Self::load_usages(&conn, raw_material_ids)?;

        Ok(existing
            .into_iter()
            .map(|id| (id, usages.remove(&id).unwrap_or_default()))
            .collect())
    }

    fn load_usages(
        conn: &Connection,
        raw_material_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, Vec<AdditiveUsage>>> {
        let sql = format!(
            r#"
            SELECT raw_material_id, additive_id, usage_amount, exemption_type, allergen_origin
            FROM raw_material_additive
            WHERE raw_material_id IN ({})
            ORDER BY raw_material_id, seq_no
            "#,
            placeholders(raw_material_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(raw_material_ids.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result: HashMap<i64, Vec<AdditiveUsage>> = HashMap::new();
        for (raw_material_id, additive_id, usage_amount, exemption_raw, allergen_origin) in rows {
            let exemption_type = exemption_raw
                .parse::<ExemptionType>()
                .map_err(|e| RepositoryError::field("exemption_type", e))?;
            result.entry(raw_material_id).or_default().push(AdditiveUsage {
                additive_id,
                usage_amount,
                exemption_type,
                allergen_origin,
            });
        }
        Ok(result)
    }
}

/// `?,?,?` 形式的占位符
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

/// 在给定ID中筛选出已登记的原材料
pub(crate) fn existing_raw_materials(
    conn: &Connection,
    raw_material_ids: &[i64],
) -> RepositoryResult<Vec<i64>> {
    let sql = format!(
        "SELECT id FROM composition_node WHERE kind = 'RAW_MATERIAL' AND id IN ({})",
        placeholders(raw_material_ids.len())
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params_from_iter(raw_material_ids.iter()), |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

// ==========================================
// 协作者 Trait 实现
// ==========================================

impl AdditiveLookup for AdditiveRepository {
    fn additives_for(&self, raw_material_id: i64) -> LookupResult<Vec<AdditiveUsage>> {
        Ok(self.find_usages(raw_material_id)?)
    }

    fn additives_for_many(
        &self,
        raw_material_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<AdditiveUsage>>, LookupError> {
        Ok(self.find_usages_many(raw_material_ids)?)
    }
}

impl AdditiveCatalog for AdditiveRepository {
    fn lookup(&self, additive_id: i64) -> LookupResult<AdditiveInfo> {
        Ok(self.find_additive(additive_id)?)
    }
}
