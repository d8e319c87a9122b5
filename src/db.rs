// ==========================================
// 食品表示引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键/busy_timeout)
// - 提供参考表结构,供 SQLite 协作者与测试使用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version (若表不存在则返回 None)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 创建参考表结构 (幂等)
///
/// # 表
/// - composition_node / composition_link: 配合结构
/// - raw_material_nutrient: 原材料营养成分 (每 100g)
/// - additive / raw_material_additive: 添加物目录与使用
/// - raw_material_allergen: 原材料过敏原 (目录索引)
/// - label_result: 生成结果 (JSON)
/// - config_kv / schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS composition_node (
            kind TEXT NOT NULL,
            id INTEGER NOT NULL,
            name TEXT,
            input_mode TEXT NOT NULL DEFAULT 'RATIO',
            PRIMARY KEY (kind, id)
        );

        CREATE TABLE IF NOT EXISTS composition_link (
            parent_kind TEXT NOT NULL,
            parent_id INTEGER NOT NULL,
            seq_no INTEGER NOT NULL,
            raw_material_id INTEGER,
            pre_product_id INTEGER,
            mixing_ratio REAL,
            weight REAL,
            cost REAL,
            PRIMARY KEY (parent_kind, parent_id, seq_no),
            FOREIGN KEY (parent_kind, parent_id)
                REFERENCES composition_node(kind, id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS raw_material_nutrient (
            raw_material_id INTEGER NOT NULL,
            nutrient_code TEXT NOT NULL,
            value REAL NOT NULL,
            quality TEXT,
            PRIMARY KEY (raw_material_id, nutrient_code)
        );

        CREATE TABLE IF NOT EXISTS additive (
            additive_id INTEGER PRIMARY KEY,
            substance_name TEXT NOT NULL,
            simplified_name TEXT,
            collective_name TEXT,
            purpose_category TEXT,
            requires_purpose_display INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS raw_material_additive (
            raw_material_id INTEGER NOT NULL,
            seq_no INTEGER NOT NULL,
            additive_id INTEGER NOT NULL,
            usage_amount REAL NOT NULL,
            exemption_type TEXT NOT NULL,
            allergen_origin TEXT,
            PRIMARY KEY (raw_material_id, seq_no)
        );

        CREATE TABLE IF NOT EXISTS raw_material_allergen (
            raw_material_id INTEGER NOT NULL,
            allergen_index INTEGER NOT NULL CHECK (allergen_index BETWEEN 1 AND 30),
            PRIMARY KEY (raw_material_id, allergen_index)
        );

        CREATE TABLE IF NOT EXISTS label_result (
            result_id TEXT PRIMARY KEY,
            root_kind TEXT NOT NULL,
            root_id INTEGER NOT NULL,
            payload_json TEXT NOT NULL,
            computed_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_label_result_root
            ON label_result(root_kind, root_id, computed_at);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        );
        "#,
    )?;

    if read_schema_version(conn)?.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
