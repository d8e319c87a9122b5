// ==========================================
// 食品表示引擎 - 过敏原汇总引擎
// ==========================================
// 职责: 按 30 项目录合并展开后叶子的过敏原标记
// 输入: 叶子贡献 + AllergenLookup
// 输出: AllergenSummary (义务/推荐项均返回)
// ==========================================
// 红线: 每个叶子的标记是二值的,贡献为该叶子的有效重量
// 红线: 保留槽位 (30) 不参与汇总
// ==========================================

use crate::domain::allergen::{AllergenCatalog, AllergenSummary, MergedAllergen};
use crate::domain::composition::{merge_leaves, LeafContribution};
use crate::engine::cancel::CancellationToken;
use crate::engine::collaborators::AllergenLookup;
use crate::engine::error::{EngineError, EngineResult, ReferenceKind};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// AllergenAggregator - 过敏原汇总引擎
// ==========================================
pub struct AllergenAggregator {
    // 无状态引擎
}

impl AllergenAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 汇总过敏原
    ///
    /// # 参数
    /// - `leaves`: 展开后的叶子 (可含重复原材料)
    /// - `lookup`: 原材料 → 过敏原标记
    /// - `token`: 取消标记,每个原材料处理前检查
    ///
    /// # 返回
    /// - Ok(AllergenSummary): 按合计重量降序,同重量按目录索引升序
    /// - Err(MissingReference): 原材料无过敏原记录
    pub fn aggregate(
        &self,
        leaves: &[LeafContribution],
        lookup: &dyn AllergenLookup,
        token: &CancellationToken,
    ) -> EngineResult<AllergenSummary> {
        let merged_leaves = merge_leaves(leaves);
        let ids: Vec<i64> = merged_leaves.iter().map(|l| l.raw_material_id).collect();

        debug!(leaf_count = leaves.len(), raw_materials = ids.len(), "开始过敏原汇总");

        let flags_by_material = lookup.allergens_for_many(&ids)?;

        // 目录索引 → 合计重量
        let mut totals: BTreeMap<u8, f64> = BTreeMap::new();
        for leaf in &merged_leaves {
            token.check()?;

            let flags = flags_by_material.get(&leaf.raw_material_id).ok_or(
                EngineError::MissingReference {
                    entity: ReferenceKind::AllergenFlags,
                    id: leaf.raw_material_id,
                },
            )?;

            for entry in flags.flagged() {
                *totals.entry(entry.index).or_insert(0.0) += leaf.effective_weight;
            }
        }

        let mut items: Vec<MergedAllergen> = totals
            .into_iter()
            .filter_map(|(index, total_weight)| {
                AllergenCatalog::by_index(index).map(|entry| {
                    MergedAllergen {
                        index,
                        item: entry.item,
                        display_name: entry.display_name.to_string(),
                        key: entry.key.to_string(),
                        mandatory: entry.mandatory,
                        total_weight,
                    }
                })
            })
            .collect();

        items.sort_by(|a, b| {
            b.total_weight
                .total_cmp(&a.total_weight)
                .then_with(|| a.index.cmp(&b.index))
        });

        debug!(
            allergen_count = items.len(),
            mandatory_count = items.iter().filter(|i| i.mandatory).count(),
            "过敏原汇总完成"
        );

        Ok(AllergenSummary::new(items, Utc::now()))
    }
}

impl Default for AllergenAggregator {
    fn default() -> Self {
        Self::new()
    }
}
