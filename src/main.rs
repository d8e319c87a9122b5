// ==========================================
// 食品表示引擎 - 命令行入口
// ==========================================
// 用法:
//   food-label-engine <kind> <id> [db_path]
//   kind: RAW_MATERIAL / PRE_PRODUCT / SEMI_FINISHED_PRODUCT
// 输出: 生成结果 (JSON) 写到标准输出,结果同时保存到 label_result 表
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use food_label_engine::api::LabelApi;
use food_label_engine::config::ConfigManager;
use food_label_engine::db::{init_schema, open_sqlite_connection};
use food_label_engine::domain::types::NodeKind;
use food_label_engine::repository::{sqlite_label_sources, LabelResultRepository};
use food_label_engine::{logging, APP_NAME, VERSION};

/// 数据库路径环境变量
const DB_PATH_ENV: &str = "FOOD_LABEL_DB_PATH";

const USAGE: &str = "用法: food-label-engine <kind> <id> [db_path]";

/// 默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./food_label.db");
    if let Some(data_dir) = dirs::data_local_dir() {
        let dir = data_dir.join("food-label-engine");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("food_label.db");
        }
    }
    path.to_string_lossy().to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let kind: NodeKind = args
        .next()
        .ok_or_else(|| anyhow!(USAGE))?
        .parse()
        .map_err(|e: String| anyhow!("{}\n{}", e, USAGE))?;
    let id: i64 = args
        .next()
        .ok_or_else(|| anyhow!(USAGE))?
        .trim()
        .parse()
        .with_context(|| format!("节点ID必须为整数\n{}", USAGE))?;
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    tracing::info!(version = VERSION, db_path = %db_path, "{} 启动", APP_NAME);

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("初始化表结构失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone())?.load_engine_config()?;
    let sources = sqlite_label_sources(conn.clone());
    let sink = Arc::new(LabelResultRepository::from_connection(conn));

    let api = LabelApi::new(config, sources, sink)?;
    let result = api.generate_label(kind, id).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
