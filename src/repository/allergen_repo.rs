// ==========================================
// 食品表示引擎 - 过敏原仓储
// ==========================================
// 职责: raw_material_allergen 的读写 (每行一个已标记的目录索引)
// ==========================================

use crate::domain::allergen::AllergenFlags;
use crate::domain::types::NodeKind;
use crate::engine::collaborators::{AllergenLookup, LookupError, LookupResult};
use crate::repository::additive_repo::{existing_raw_materials, placeholders};
use crate::repository::composition_repo::CompositionRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AllergenRepository - 过敏原仓储
// ==========================================
pub struct AllergenRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllergenRepository {
    /// 创建新的 AllergenRepository 实例
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

    /// 替换原材料的过敏原标记
    pub fn set_flags(&self, raw_material_id: i64, flags: &AllergenFlags) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM raw_material_allergen WHERE raw_material_id = ?1",
            params![raw_material_id],
        )?;
        for (slot, set) in flags.slots().iter().enumerate() {
            if *set {
                tx.execute(
                    "INSERT INTO raw_material_allergen (raw_material_id, allergen_index) VALUES (?1, ?2)",
                    params![raw_material_id, slot as i64 + 1],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 查询原材料的过敏原标记
    ///
    /// # 返回
    /// - Ok(Some(flags)): 原材料存在 (无记录时为全 false)
    /// - Ok(None): 原材料不存在
    pub fn find_flags(&self, raw_material_id: i64) -> RepositoryResult<Option<AllergenFlags>> {
        let conn = self.get_conn()?;
        if !CompositionRepository::exists(&conn, NodeKind::RawMaterial, raw_material_id)? {
            return Ok(None);
        }
        let mut by_material = Self::load_flags(&conn, &[raw_material_id])?;
        Ok(Some(by_material.remove(&raw_material_id).unwrap_or_default()))
    }

    /// 批量查询
    pub fn find_flags_many(
        &self,
        raw_material_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, AllergenFlags>> {
        if raw_material_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.get_conn()?;

        let existing = existing_raw_materials(&conn, raw_material_ids)?;
        let mut flags = Self::load_flags(&conn, raw_material_ids)?;

        Ok(existing
            .into_iter()
            .map(|id| (id, flags.remove(&id).unwrap_or_default()))
            .collect())
    }

    fn load_flags(
        conn: &Connection,
        raw_material_ids: &[i64],
    ) -> RepositoryResult<HashMap<i64, AllergenFlags>> {
        let sql = format!(
            "SELECT raw_material_id, allergen_index FROM raw_material_allergen WHERE raw_material_id IN ({})",
            placeholders(raw_material_ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(raw_material_ids.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result: HashMap<i64, AllergenFlags> = HashMap::new();
        for (raw_material_id, index) in rows {
            let index = u8::try_from(index)
                .map_err(|_| RepositoryError::field("allergen_index", format!("越界: {}", index)))?;
            if !result.entry(raw_material_id).or_default().set_index(index) {
                return Err(RepositoryError::field(
                    "allergen_index",
                    format!("越界: {}", index),
                ));
            }
        }
        Ok(result)
    }
}

// ==========================================
// 协作者 Trait 实现
// ==========================================

impl AllergenLookup for AllergenRepository {
    fn allergens_for(&self, raw_material_id: i64) -> LookupResult<AllergenFlags> {
        Ok(self.find_flags(raw_material_id)?)
    }

    fn allergens_for_many(
        &self,
        raw_material_ids: &[i64],
    ) -> Result<HashMap<i64, AllergenFlags>, LookupError> {
        Ok(self.find_flags_many(raw_material_ids)?)
    }
}
