// ==========================================
// 食品表示引擎 - 表示结果
// ==========================================
// 职责: 一次表示生成的完整输出,交由调用方持久化/展示
// ==========================================

use crate::domain::additive::AdditiveSummary;
use crate::domain::allergen::AllergenSummary;
use crate::domain::composition::LeafContribution;
use crate::domain::nutrient::NutrientVector;
use crate::domain::types::NodeKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelResult {
    // ===== 标识 =====
    pub result_id: String,
    pub root: NodeKey,

    // ===== 汇总 =====
    pub nutrients: NutrientVector,      // 每 100g
    pub leaves: Vec<LeafContribution>,  // 展开后的叶子 (未合并)
    pub additive_summary: AdditiveSummary,
    pub allergen_summary: AllergenSummary,

    // ===== 表示文 =====
    pub additive_display: String,
    pub allergen_display: Vec<String>,
    pub allergen_statement: String,
    pub nutrition_facts: Vec<String>,

    pub computed_at: DateTime<Utc>,
}
