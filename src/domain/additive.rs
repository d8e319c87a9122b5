// ==========================================
// 食品表示引擎 - 添加物领域模型
// ==========================================
// 职责: 添加物目录条目、原材料上的添加物使用、合并结果与汇总
// 红线: 表示名解析不在此处,由 LabelFormatter 统一处理
// ==========================================

use crate::domain::types::{ExemptionType, PurposeCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// AdditiveInfo - 添加物目录条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveInfo {
    pub additive_id: i64,
    pub substance_name: String,                     // 物质名
    #[serde(default)]
    pub simplified_name: Option<String>,            // 简略名
    #[serde(default)]
    pub collective_name: Option<String>,            // 一括名 (machine key 或表示名)
    #[serde(default)]
    pub purpose_category: Option<PurposeCategory>,  // 用途分类
    #[serde(default)]
    pub requires_purpose_display: bool,             // 是否需要用途名併記
}

impl AdditiveInfo {
    pub fn new(additive_id: i64, substance_name: impl Into<String>) -> Self {
        Self {
            additive_id,
            substance_name: substance_name.into(),
            simplified_name: None,
            collective_name: None,
            purpose_category: None,
            requires_purpose_display: false,
        }
    }

    pub fn with_simplified_name(mut self, name: impl Into<String>) -> Self {
        self.simplified_name = Some(name.into());
        self
    }

    pub fn with_collective_name(mut self, name: impl Into<String>) -> Self {
        self.collective_name = Some(name.into());
        self
    }

    /// 设置用途分类并要求用途名併記
    pub fn with_purpose_display(mut self, purpose: PurposeCategory) -> Self {
        self.purpose_category = Some(purpose);
        self.requires_purpose_display = true;
        self
    }

    pub fn with_purpose(mut self, purpose: PurposeCategory) -> Self {
        self.purpose_category = Some(purpose);
        self
    }
}

// ==========================================
// AdditiveUsage - 原材料上的添加物使用
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveUsage {
    pub additive_id: i64,
    pub usage_amount: f64,              // 每 100g 原材料中的使用量 (g)
    pub exemption_type: ExemptionType,
    #[serde(default)]
    pub allergen_origin: Option<String>, // 过敏原由来注记
}

impl AdditiveUsage {
    pub fn new(additive_id: i64, usage_amount: f64, exemption_type: ExemptionType) -> Self {
        Self {
            additive_id,
            usage_amount,
            exemption_type,
            allergen_origin: None,
        }
    }

    pub fn with_allergen_origin(mut self, origin: impl Into<String>) -> Self {
        self.allergen_origin = Some(origin.into());
        self
    }
}

// ==========================================
// MergedAdditive - 合并后的添加物
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedAdditive {
    pub additive: AdditiveInfo,
    pub total_weight: f64,             // 合计使用重量
    pub exemption_type: ExemptionType, // 合并后的豁免类型 (取最需表示者)
    pub allergen_origins: Vec<String>, // 去重后升序
}

impl MergedAdditive {
    pub fn additive_id(&self) -> i64 {
        self.additive.additive_id
    }

    pub fn is_displayable(&self) -> bool {
        self.exemption_type.is_displayable()
    }
}

// ==========================================
// AdditiveSummary - 添加物汇总
// ==========================================
// 构造后不可变;按合计重量降序,同重量按 additive_id 升序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditiveSummary {
    items: Vec<MergedAdditive>,
    computed_at: DateTime<Utc>,
}

impl AdditiveSummary {
    /// 由已排序的合并结果构造
    pub fn new(items: Vec<MergedAdditive>, computed_at: DateTime<Utc>) -> Self {
        Self { items, computed_at }
    }

    pub fn items(&self) -> &[MergedAdditive] {
        &self.items
    }

    /// 需要表示的子集 (保持排序)
    pub fn displayable(&self) -> impl Iterator<Item = &MergedAdditive> {
        self.items.iter().filter(|item| item.is_displayable())
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn find(&self, additive_id: i64) -> Option<&MergedAdditive> {
        self.items.iter().find(|item| item.additive_id() == additive_id)
    }
}
