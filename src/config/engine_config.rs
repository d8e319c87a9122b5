// ==========================================
// 食品表示引擎 - 引擎配置
// ==========================================
// 职责: 展开上限、记忆化开关、过敏原表示策略、请求超时
// 来源: 默认值 + config_kv 覆写 (见 ConfigManager)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::engine::label_formatter::AllergenDisplayPolicy;
use serde::{Deserialize, Serialize};

/// 默认最大展开深度 (根为 0)
pub const DEFAULT_MAX_DEPTH: usize = 32;
/// 默认单次展开最大访问节点数
pub const DEFAULT_MAX_NODES: usize = 10_000;
/// 默认请求超时 (毫秒)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

// ==========================================
// EngineConfig - 引擎配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ===== 展开上限 =====
    pub max_depth: usize,
    pub max_nodes: usize, // 含记忆化命中的子树节点

    // ===== 展开优化 =====
    pub memoize: bool, // 请求内记忆化 (菱形共享结构)

    // ===== 表示 =====
    pub allergen_display_policy: AllergenDisplayPolicy,

    // ===== API =====
    pub request_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            memoize: true,
            allergen_display_policy: AllergenDisplayPolicy::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl EngineConfig {
    /// 校验配置
    ///
    /// # 返回
    /// - Err(Validation): 任一上限为 0
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth == 0 {
            return Err(ConfigError::Validation("max_depth 必须大于 0".to_string()));
        }
        if self.max_nodes == 0 {
            return Err(ConfigError::Validation("max_nodes 必须大于 0".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "request_timeout_ms 必须大于 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_depth, 32);
        assert_eq!(config.max_nodes, 10_000);
        assert!(config.memoize);
        assert_eq!(config.allergen_display_policy, AllergenDisplayPolicy::MandatoryFirst);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let config = EngineConfig {
            max_nodes: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_nodes, DEFAULT_MAX_NODES);
    }
}
