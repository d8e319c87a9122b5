// ==========================================
// 食品表示引擎 - 添加物汇总引擎
// ==========================================
// 职责: 收集展开后叶子的添加物使用,按添加物ID合并
// 输入: 叶子贡献 + AdditiveLookup + AdditiveCatalog
// 输出: AdditiveSummary (全部合并结果,按重量降序)
// ==========================================
// 红线: 合并结果与叶子顺序无关
// 红线: 表示子集由 AdditiveSummary::displayable 过滤,此处不丢弃任何项
// ==========================================

use crate::domain::additive::{AdditiveSummary, MergedAdditive};
use crate::domain::composition::{merge_leaves, LeafContribution};
use crate::domain::types::ExemptionType;
use crate::engine::cancel::CancellationToken;
use crate::engine::collaborators::{AdditiveCatalog, AdditiveLookup};
use crate::engine::error::{EngineError, EngineResult, ReferenceKind};
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// 合并中的累计值
struct Accumulator {
    total_weight: f64,
    exemption_type: ExemptionType,
    origins: BTreeSet<String>,
}

// ==========================================
// AdditiveAggregator - 添加物汇总引擎
// ==========================================
pub struct AdditiveAggregator {
    // 无状态引擎
}

impl AdditiveAggregator {
    pub fn new() -> Self {
        Self {}
    }

    /// 汇总添加物
    ///
    /// # 参数
    /// - `leaves`: 展开后的叶子 (可含重复原材料)
    /// - `lookup`: 原材料 → 添加物使用
    /// - `catalog`: 添加物目录
    /// - `token`: 取消标记,每个原材料处理前检查
    ///
    /// # 返回
    /// - Ok(AdditiveSummary): 按合计重量降序,同重量按 additive_id 升序
    /// - Err(MissingReference): 原材料无添加物记录,或添加物不在目录中
    pub fn aggregate(
        &self,
        leaves: &[LeafContribution],
        lookup: &dyn AdditiveLookup,
        catalog: &dyn AdditiveCatalog,
        token: &CancellationToken,
    ) -> EngineResult<AdditiveSummary> {
        let merged_leaves = merge_leaves(leaves);
        let ids: Vec<i64> = merged_leaves.iter().map(|l| l.raw_material_id).collect();

        debug!(leaf_count = leaves.len(), raw_materials = ids.len(), "开始添加物汇总");

        let usages_by_material = lookup.additives_for_many(&ids)?;

        let mut acc: HashMap<i64, Accumulator> = HashMap::new();
        for leaf in &merged_leaves {
            token.check()?;

            let usages = usages_by_material.get(&leaf.raw_material_id).ok_or(
                EngineError::MissingReference {
                    entity: ReferenceKind::RawMaterial,
                    id: leaf.raw_material_id,
                },
            )?;

            for usage in usages {
                let contribution = usage.usage_amount * leaf.effective_weight / 100.0;
                trace!(
                    raw_material_id = leaf.raw_material_id,
                    additive_id = usage.additive_id,
                    contribution,
                    "添加物贡献"
                );

                let entry = acc.entry(usage.additive_id).or_insert_with(|| Accumulator {
                    total_weight: 0.0,
                    exemption_type: usage.exemption_type,
                    origins: BTreeSet::new(),
                });
                entry.total_weight += contribution;
                entry.exemption_type = entry.exemption_type.most_disclosing(usage.exemption_type);
                if let Some(origin) = usage.allergen_origin.as_deref().map(str::trim) {
                    if !origin.is_empty() {
                        entry.origins.insert(origin.to_string());
                    }
                }
            }
        }

        let mut items = Vec::with_capacity(acc.len());
        for (additive_id, merged) in acc {
            let additive = catalog.lookup(additive_id)?.ok_or(EngineError::MissingReference {
                entity: ReferenceKind::Additive,
                id: additive_id,
            })?;
            items.push(MergedAdditive {
                additive,
                total_weight: merged.total_weight,
                exemption_type: merged.exemption_type,
                allergen_origins: merged.origins.into_iter().collect(),
            });
        }

        items.sort_by(|a, b| compare_additives(a, b));

        debug!(additive_count = items.len(), "添加物汇总完成");

        Ok(AdditiveSummary::new(items, Utc::now()))
    }
}

impl Default for AdditiveAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// 排序: 合计重量降序,同重量按 additive_id 升序
fn compare_additives(a: &MergedAdditive, b: &MergedAdditive) -> Ordering {
    b.total_weight
        .total_cmp(&a.total_weight)
        .then_with(|| a.additive_id().cmp(&b.additive_id()))
}
