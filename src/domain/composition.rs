// ==========================================
// 食品表示引擎 - 配合结构领域模型
// ==========================================
// 职责: 配合节点 (原材料/仕掛品/半製品)、配合行、叶子贡献
// 红线: 不含遍历逻辑,遍历由 RollupEngine 负责
// ==========================================

use crate::domain::nutrient::NutrientVector;
use crate::domain::types::{ComponentKind, NodeKey, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// InputMode - 配合输入方式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputMode {
    Ratio,  // 按配合比例 (mixing_ratio)
    Weight, // 按重量 (weight), 引擎按总重量归一化
}

impl Default for InputMode {
    fn default() -> Self {
        InputMode::Ratio
    }
}

impl InputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMode::Ratio => "RATIO",
            InputMode::Weight => "WEIGHT",
        }
    }
}

impl std::str::FromStr for InputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RATIO" => Ok(InputMode::Ratio),
            "WEIGHT" => Ok(InputMode::Weight),
            other => Err(format!("未知配合输入方式: {}", other)),
        }
    }
}

// ==========================================
// CompositionLink - 配合行
// ==========================================
// 与上游数据保持同形: 原材料ID与仕掛品ID二选一
// 同时为空或同时有值由引擎判定为无效配合
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompositionLink {
    // ===== 子项引用 =====
    #[serde(default)]
    pub raw_material_id: Option<i64>,
    #[serde(default)]
    pub pre_product_id: Option<i64>,

    // ===== 配合量 =====
    #[serde(default)]
    pub mixing_ratio: Option<f64>, // 比例 (0 < ratio <= 1)
    #[serde(default)]
    pub weight: Option<f64>,       // 重量 (复合节点基准单位)

    // ===== 成本 =====
    #[serde(default)]
    pub cost: Option<f64>,
}

impl CompositionLink {
    /// 比例方式配合行
    pub fn ratio(kind: ComponentKind, id: i64, mixing_ratio: f64) -> Self {
        let mut link = Self::reference(kind, id);
        link.mixing_ratio = Some(mixing_ratio);
        link
    }

    /// 重量方式配合行
    pub fn weight(kind: ComponentKind, id: i64, weight: f64) -> Self {
        let mut link = Self::reference(kind, id);
        link.weight = Some(weight);
        link
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    fn reference(kind: ComponentKind, id: i64) -> Self {
        match kind {
            ComponentKind::RawMaterial => Self {
                raw_material_id: Some(id),
                ..Default::default()
            },
            ComponentKind::PreProduct => Self {
                pre_product_id: Some(id),
                ..Default::default()
            },
        }
    }

    /// 解析子项引用
    ///
    /// # 返回
    /// - Ok((kind, id)): 恰好引用一个子项
    /// - Err(reason): 同时引用两种或均未引用
    pub fn child(&self) -> Result<(ComponentKind, i64), String> {
        match (self.raw_material_id, self.pre_product_id) {
            (Some(id), None) => Ok((ComponentKind::RawMaterial, id)),
            (None, Some(id)) => Ok((ComponentKind::PreProduct, id)),
            (Some(rm), Some(pp)) => Err(format!(
                "配合行同时引用原材料#{}与仕掛品#{}",
                rm, pp
            )),
            (None, None) => Err("配合行未引用任何子项".to_string()),
        }
    }
}

// ==========================================
// NodeBody - 节点内容
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeBody {
    /// 叶子: 自身的营养成分 (每 100g)
    Leaf { nutrients: NutrientVector },
    /// 复合: 有序配合行
    Composite {
        #[serde(default)]
        input_mode: InputMode,
        links: Vec<CompositionLink>,
    },
}

// ==========================================
// CompositionNode - 配合节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionNode {
    pub id: i64,
    pub kind: NodeKind,
    #[serde(default)]
    pub name: Option<String>,
    pub body: NodeBody,
}

impl CompositionNode {
    pub fn raw_material(id: i64, nutrients: NutrientVector) -> Self {
        Self {
            id,
            kind: NodeKind::RawMaterial,
            name: None,
            body: NodeBody::Leaf { nutrients },
        }
    }

    pub fn pre_product(id: i64, input_mode: InputMode, links: Vec<CompositionLink>) -> Self {
        Self::composite(NodeKind::PreProduct, id, input_mode, links)
    }

    pub fn semi_finished(id: i64, input_mode: InputMode, links: Vec<CompositionLink>) -> Self {
        Self::composite(NodeKind::SemiFinishedProduct, id, input_mode, links)
    }

    pub fn composite(
        kind: NodeKind,
        id: i64,
        input_mode: InputMode,
        links: Vec<CompositionLink>,
    ) -> Self {
        Self {
            id,
            kind,
            name: None,
            body: NodeBody::Composite { input_mode, links },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.kind, self.id)
    }

    /// 复合节点的配合行成本合计 (未设置成本的行不计入)
    pub fn total_link_cost(&self) -> Option<f64> {
        match &self.body {
            NodeBody::Leaf { .. } => None,
            NodeBody::Composite { links, .. } => {
                Some(links.iter().filter_map(|l| l.cost).sum())
            }
        }
    }
}

// ==========================================
// LeafContribution - 叶子贡献
// ==========================================
// 展开后的 (原材料ID, 有效重量),聚合器据此计算添加物/过敏原
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafContribution {
    pub raw_material_id: i64,
    pub effective_weight: f64,
}

impl LeafContribution {
    pub fn new(raw_material_id: i64, effective_weight: f64) -> Self {
        Self {
            raw_material_id,
            effective_weight,
        }
    }
}

/// 按原材料ID合并叶子贡献 (按ID升序)
///
/// 同一原材料经由不同路径出现时,其有效重量相加
pub fn merge_leaves(leaves: &[LeafContribution]) -> Vec<LeafContribution> {
    let mut merged: BTreeMap<i64, f64> = BTreeMap::new();
    for leaf in leaves {
        *merged.entry(leaf.raw_material_id).or_insert(0.0) += leaf.effective_weight;
    }
    merged
        .into_iter()
        .map(|(id, weight)| LeafContribution::new(id, weight))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_child_exactly_one() {
        let link = CompositionLink::ratio(ComponentKind::PreProduct, 7, 0.5);
        assert_eq!(link.child(), Ok((ComponentKind::PreProduct, 7)));

        let both = CompositionLink {
            raw_material_id: Some(1),
            pre_product_id: Some(2),
            mixing_ratio: Some(1.0),
            ..Default::default()
        };
        assert!(both.child().is_err());

        let neither = CompositionLink {
            mixing_ratio: Some(1.0),
            ..Default::default()
        };
        assert!(neither.child().is_err());
    }

    #[test]
    fn test_total_link_cost() {
        let node = CompositionNode::pre_product(
            1,
            InputMode::Ratio,
            vec![
                CompositionLink::ratio(ComponentKind::RawMaterial, 1, 0.5).with_cost(120.0),
                CompositionLink::ratio(ComponentKind::RawMaterial, 2, 0.5),
                CompositionLink::ratio(ComponentKind::RawMaterial, 3, 0.1).with_cost(30.0),
            ],
        );
        assert_eq!(node.total_link_cost(), Some(150.0));
        assert_eq!(
            CompositionNode::raw_material(1, NutrientVector::new()).total_link_cost(),
            None
        );
    }

    #[test]
    fn test_merge_leaves_sums_duplicates() {
        let leaves = vec![
            LeafContribution::new(5, 0.2),
            LeafContribution::new(3, 0.5),
            LeafContribution::new(5, 0.1),
        ];
        let merged = merge_leaves(&leaves);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].raw_material_id, 3);
        assert_eq!(merged[1].raw_material_id, 5);
        assert!((merged[1].effective_weight - 0.3).abs() < 1e-12);
    }
}
