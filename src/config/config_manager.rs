// ==========================================
// 食品表示引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 红线: 缺失的键使用默认值;格式错误的值返回 InvalidValue,不静默回退
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::open_sqlite_connection;
use crate::engine::label_formatter::AllergenDisplayPolicy;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 对传入连接再次应用统一 PRAGMA (幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    ///
    /// 已知键会先按其类型解析,格式错误时拒绝写入
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        validate_known_key(key, value)?;

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        debug!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照 (JSON 格式,键升序)
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取引擎配置
    ///
    /// # 返回
    /// - Ok(EngineConfig): 默认值 + config_kv 覆写,已校验
    /// - Err(InvalidValue): 某个键的值无法解析
    /// - Err(Validation): 覆写后的配置不合法
    pub fn load_engine_config(&self) -> ConfigResult<EngineConfig> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            max_depth: self.parsed_or(config_keys::MAX_DEPTH, defaults.max_depth)?,
            max_nodes: self.parsed_or(config_keys::MAX_NODES, defaults.max_nodes)?,
            memoize: match self.get_global_config_value(config_keys::MEMOIZE)? {
                Some(raw) => parse_bool(config_keys::MEMOIZE, &raw)?,
                None => defaults.memoize,
            },
            allergen_display_policy: self.parsed_or(
                config_keys::ALLERGEN_DISPLAY_POLICY,
                defaults.allergen_display_policy,
            )?,
            request_timeout_ms: self
                .parsed_or(config_keys::REQUEST_TIMEOUT_MS, defaults.request_timeout_ms)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get_global_config_value(key)? {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "期望布尔值".to_string(),
        }),
    }
}

/// 已知键的类型校验;未知键不校验
fn validate_known_key(key: &str, value: &str) -> ConfigResult<()> {
    match key {
        config_keys::MAX_DEPTH | config_keys::MAX_NODES => {
            parse_value::<usize>(key, value).map(|_| ())
        }
        config_keys::REQUEST_TIMEOUT_MS => parse_value::<u64>(key, value).map(|_| ()),
        config_keys::MEMOIZE => parse_bool(key, value).map(|_| ()),
        config_keys::ALLERGEN_DISPLAY_POLICY => {
            parse_value::<AllergenDisplayPolicy>(key, value).map(|_| ())
        }
        _ => Ok(()),
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 展开上限
    pub const MAX_DEPTH: &str = "rollup_max_depth";
    pub const MAX_NODES: &str = "rollup_max_nodes";

    // 展开优化
    pub const MEMOIZE: &str = "rollup_memoize";

    // 表示
    pub const ALLERGEN_DISPLAY_POLICY: &str = "allergen_display_policy";

    // API
    pub const REQUEST_TIMEOUT_MS: &str = "request_timeout_ms";
}
