// ==========================================
// 食品表示引擎 - 引擎编排器
// ==========================================
// 用途: 协调展开、添加物汇总、过敏原汇总、表示文生成的执行顺序
// 流程: Rollup → (Additive, Allergen 基于同一叶子集合) → Formatter
// ==========================================

use crate::config::EngineConfig;
use crate::domain::composition::CompositionNode;
use crate::domain::label::LabelResult;
use crate::domain::types::NodeKey;
use crate::engine::cancel::CancellationToken;
use crate::engine::error::{EngineError, EngineResult, ReferenceKind};
use crate::engine::label_formatter::{
    allergen_statement, format_additive_display, format_allergen_display, format_nutrition_facts,
};
use crate::engine::sources::LabelSources;
use crate::engine::{AdditiveAggregator, AllergenAggregator, RollupEngine};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// LabelOrchestrator - 引擎编排器
// ==========================================
pub struct LabelOrchestrator {
    config: EngineConfig,
    rollup: RollupEngine,
    additives: AdditiveAggregator,
    allergens: AllergenAggregator,
}

impl LabelOrchestrator {
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 引擎配置
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rollup: RollupEngine::with_config(&config),
            additives: AdditiveAggregator::new(),
            allergens: AllergenAggregator::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 按 (类型, ID) 读取根节点并生成表示
    ///
    /// # 返回
    /// - Err(MissingReference): 根节点不存在
    pub fn generate_for(
        &self,
        key: NodeKey,
        sources: &LabelSources,
        token: &CancellationToken,
    ) -> EngineResult<LabelResult> {
        let root = sources
            .nodes
            .load_node(key.kind, key.id)?
            .ok_or(EngineError::MissingReference {
                entity: ReferenceKind::from(key.kind),
                id: key.id,
            })?;
        self.generate(&root, sources, token)
    }

    /// 执行完整表示生成流程
    ///
    /// # 参数
    /// - root: 根节点
    /// - sources: 数据源集合
    /// - token: 取消标记
    ///
    /// # 返回
    /// LabelResult (不持久化)
    pub fn generate(
        &self,
        root: &CompositionNode,
        sources: &LabelSources,
        token: &CancellationToken,
    ) -> EngineResult<LabelResult> {
        let key = root.key();
        info!(root = %key, "开始生成食品表示");

        match self.run(root, sources, token) {
            Ok(result) => {
                info!(
                    root = %key,
                    result_id = %result.result_id,
                    leaf_count = result.leaves.len(),
                    additive_count = result.additive_summary.len(),
                    allergen_count = result.allergen_summary.items().len(),
                    "食品表示生成完成"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(root = %key, error = %e, "食品表示生成失败");
                Err(e)
            }
        }
    }

    fn run(
        &self,
        root: &CompositionNode,
        sources: &LabelSources,
        token: &CancellationToken,
    ) -> EngineResult<LabelResult> {
        // ==========================================
        // 步骤1: 配合展开
        // ==========================================
        debug!("步骤1: 配合展开");
        let rollup = self
            .rollup
            .rollup_with(root, sources.children.as_ref(), 1.0, token)?;

        // ==========================================
        // 步骤2: 添加物汇总
        // ==========================================
        debug!("步骤2: 添加物汇总");
        let additive_summary = self.additives.aggregate(
            &rollup.leaves,
            sources.additives.as_ref(),
            sources.catalog.as_ref(),
            token,
        )?;

        // ==========================================
        // 步骤3: 过敏原汇总
        // ==========================================
        debug!("步骤3: 过敏原汇总");
        let allergen_summary =
            self.allergens
                .aggregate(&rollup.leaves, sources.allergens.as_ref(), token)?;

        // ==========================================
        // 步骤4: 表示文生成
        // ==========================================
        debug!("步骤4: 表示文生成");
        let policy = self.config.allergen_display_policy;

        Ok(LabelResult {
            result_id: Uuid::new_v4().to_string(),
            root: root.key(),
            additive_display: format_additive_display(&additive_summary),
            allergen_display: format_allergen_display(&allergen_summary, policy),
            allergen_statement: allergen_statement(&allergen_summary, policy),
            nutrition_facts: format_nutrition_facts(&rollup.nutrients),
            nutrients: rollup.nutrients,
            leaves: rollup.leaves,
            additive_summary,
            allergen_summary,
            computed_at: Utc::now(),
        })
    }
}

impl Default for LabelOrchestrator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
