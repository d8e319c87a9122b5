// ==========================================
// 食品表示引擎 - 表示文生成
// ==========================================
// 职责: 将汇总结果渲染为食品表示法要求的文本
// 输出: 添加物表示文、过敏原表示列表、一括表示、营养成分表示
// ==========================================
// 红线: 纯函数,无副作用,不读取外部数据
// 红线: 输出顺序完全由汇总结果的顺序决定
// ==========================================

use crate::domain::additive::{AdditiveInfo, AdditiveSummary, MergedAdditive};
use crate::domain::allergen::{AllergenSummary, MergedAllergen};
use crate::domain::nutrient::{NutrientCode, NutrientVector};
use crate::domain::types::CollectiveName;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// 添加物表示文前缀 (全角斜线)
pub const ADDITIVE_MARKER: &str = "／";
/// 添加物之间的分隔符
pub const ADDITIVE_SEPARATOR: &str = "，";
/// 过敏原一括表示中的分隔符
pub const ALLERGEN_SEPARATOR: &str = "・";
/// 未知营养成分的表示
pub const UNKNOWN_VALUE: &str = "-";

// ==========================================
// AllergenDisplayPolicy - 过敏原表示顺序
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllergenDisplayPolicy {
    /// 义务项在前,推荐项在后,组内保持汇总顺序
    MandatoryFirst,
    /// 仅义务项
    MandatoryOnly,
    /// 不分组,保持汇总顺序
    WeightOrder,
}

impl Default for AllergenDisplayPolicy {
    fn default() -> Self {
        AllergenDisplayPolicy::MandatoryFirst
    }
}

impl AllergenDisplayPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllergenDisplayPolicy::MandatoryFirst => "MANDATORY_FIRST",
            AllergenDisplayPolicy::MandatoryOnly => "MANDATORY_ONLY",
            AllergenDisplayPolicy::WeightOrder => "WEIGHT_ORDER",
        }
    }
}

impl fmt::Display for AllergenDisplayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AllergenDisplayPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MANDATORY_FIRST" => Ok(AllergenDisplayPolicy::MandatoryFirst),
            "MANDATORY_ONLY" => Ok(AllergenDisplayPolicy::MandatoryOnly),
            "WEIGHT_ORDER" => Ok(AllergenDisplayPolicy::WeightOrder),
            other => Err(format!("未知过敏原表示策略: {}", other)),
        }
    }
}

// ==========================================
// 添加物
// ==========================================

/// 添加物表示名
///
/// 优先级: 有效的一括名 > 简略名 > 物质名
pub fn additive_display_name(info: &AdditiveInfo) -> String {
    if let Some(collective) = info.collective_name.as_deref().and_then(CollectiveName::lookup) {
        return collective.display_name().to_string();
    }
    match info.simplified_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => info.substance_name.trim().to_string(),
    }
}

/// 单个添加物的表示项
///
/// - 用途名併記: `用途名（表示名）`,表示名为一括名时同样併記
/// - 过敏原由来: 追加 `（由来1・由来2）`
pub fn render_additive(item: &MergedAdditive) -> String {
    let info = &item.additive;
    let name = additive_display_name(info);

    let mut rendered = match info.purpose_category.and_then(|p| p.display_name()) {
        Some(purpose) if info.requires_purpose_display => {
            format!("{}（{}）", purpose, name)
        }
        _ => name,
    };

    if !item.allergen_origins.is_empty() {
        rendered.push('（');
        rendered.push_str(&item.allergen_origins.join(ALLERGEN_SEPARATOR));
        rendered.push('）');
    }
    rendered
}

/// 添加物表示文
///
/// # 规则
/// - 仅 Required 项,保持汇总顺序 (重量降序)
/// - 渲染结果相同的项只保留首次出现的位置
/// - 非空时以 `／` 开头,项之间以全角逗号 `，` 连接;无项时返回空字符串
pub fn format_additive_display(summary: &AdditiveSummary) -> String {
    let mut entries: Vec<String> = Vec::new();
    for item in summary.displayable() {
        let rendered = render_additive(item);
        if !entries.contains(&rendered) {
            entries.push(rendered);
        }
    }

    trace!(entries = entries.len(), "添加物表示文生成");

    if entries.is_empty() {
        String::new()
    } else {
        format!("{}{}", ADDITIVE_MARKER, entries.join(ADDITIVE_SEPARATOR))
    }
}

// ==========================================
// 过敏原
// ==========================================

fn ordered_allergens(
    summary: &AllergenSummary,
    policy: AllergenDisplayPolicy,
) -> Vec<&MergedAllergen> {
    match policy {
        AllergenDisplayPolicy::MandatoryFirst => summary
            .mandatory()
            .chain(summary.non_mandatory())
            .collect(),
        AllergenDisplayPolicy::MandatoryOnly => summary.mandatory().collect(),
        AllergenDisplayPolicy::WeightOrder => summary.items().iter().collect(),
    }
}

/// 过敏原表示列表 (表示名)
pub fn format_allergen_display(
    summary: &AllergenSummary,
    policy: AllergenDisplayPolicy,
) -> Vec<String> {
    ordered_allergens(summary, policy)
        .into_iter()
        .map(|item| item.display_name.clone())
        .collect()
}

/// 过敏原一括表示: `（一部に小麦・卵を含む）`,无项时返回空字符串
pub fn allergen_statement(summary: &AllergenSummary, policy: AllergenDisplayPolicy) -> String {
    let names = format_allergen_display(summary, policy);
    if names.is_empty() {
        String::new()
    } else {
        format!("（一部に{}を含む）", names.join(ALLERGEN_SEPARATOR))
    }
}

// ==========================================
// 营养成分表示
// ==========================================

fn format_value(value: Option<f64>, decimals: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", decimals, v, unit),
        None => UNKNOWN_VALUE.to_string(),
    }
}

/// 营养成分表示 (5 项,每 100g)
///
/// - エネルギー: kcal 整数
/// - たんぱく質 / 脂質 / 炭水化物: g 小数 1 位
/// - 食塩相当量: g 小数 2 位,未设置时由ナトリウム换算
/// - 未知值表示为 `-`
pub fn format_nutrition_facts(nutrients: &NutrientVector) -> Vec<String> {
    let line = |code: NutrientCode, value: Option<f64>, decimals: usize| {
        format!(
            "{} {}",
            code.display_name(),
            format_value(value, decimals, code.unit())
        )
    };

    vec![
        line(NutrientCode::Energy, nutrients.value(NutrientCode::Energy), 0),
        line(NutrientCode::Protein, nutrients.value(NutrientCode::Protein), 1),
        line(NutrientCode::Fat, nutrients.value(NutrientCode::Fat), 1),
        line(NutrientCode::Carbohydrate, nutrients.value(NutrientCode::Carbohydrate), 1),
        line(NutrientCode::SaltEquivalent, nutrients.salt_equivalent(), 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::allergen::{AllergenCatalog, AllergenItem};
    use crate::domain::types::{ExemptionType, PurposeCategory};
    use chrono::Utc;

    fn merged(info: AdditiveInfo, weight: f64, exemption: ExemptionType) -> MergedAdditive {
        MergedAdditive {
            additive: info,
            total_weight: weight,
            exemption_type: exemption,
            allergen_origins: vec![],
        }
    }

    fn allergen(item: AllergenItem, weight: f64) -> MergedAllergen {
        let entry = AllergenCatalog::by_item(item);
        MergedAllergen {
            index: entry.index,
            item,
            display_name: entry.display_name.to_string(),
            key: entry.key.to_string(),
            mandatory: entry.mandatory,
            total_weight: weight,
        }
    }

    #[test]
    fn test_display_name_priority() {
        let base = AdditiveInfo::new(1, "ソルビン酸カリウム");
        assert_eq!(additive_display_name(&base), "ソルビン酸カリウム");

        let simplified = base.clone().with_simplified_name("ソルビン酸K");
        assert_eq!(additive_display_name(&simplified), "ソルビン酸K");

        let collective = simplified.clone().with_collective_name("flavor");
        assert_eq!(additive_display_name(&collective), "香料");

        // 不在法定目录中的一括名被忽略
        let invalid = simplified.with_collective_name("not_a_collective");
        assert_eq!(additive_display_name(&invalid), "ソルビン酸K");
    }

    #[test]
    fn test_purpose_co_display() {
        let info = AdditiveInfo::new(1, "ソルビン酸カリウム")
            .with_simplified_name("ソルビン酸K")
            .with_purpose_display(PurposeCategory::Preservative);
        let item = merged(info, 1.0, ExemptionType::Required);

        assert_eq!(render_additive(&item), "保存料（ソルビン酸K）");
    }

    #[test]
    fn test_purpose_co_display_with_collective_name() {
        let info = AdditiveInfo::new(1, "グリセリン脂肪酸エステル")
            .with_collective_name("emulsifier")
            .with_purpose_display(PurposeCategory::Stabilizer);
        let summary = AdditiveSummary::new(
            vec![
                merged(info, 2.0, ExemptionType::Required),
                merged(AdditiveInfo::new(2, "グリシン"), 1.0, ExemptionType::Required),
            ],
            Utc::now(),
        );

        assert_eq!(format_additive_display(&summary), "／安定剤（乳化剤），グリシン");
    }

    #[test]
    fn test_additive_display_full() {
        let preservative = AdditiveInfo::new(1, "ソルビン酸カリウム")
            .with_simplified_name("ソルビン酸K")
            .with_purpose_display(PurposeCategory::Preservative);
        let mut emulsifier = merged(
            AdditiveInfo::new(2, "グリセリン脂肪酸エステル").with_collective_name("emulsifier"),
            0.8,
            ExemptionType::Required,
        );
        emulsifier.allergen_origins = vec!["大豆".to_string()];
        let carryover = merged(AdditiveInfo::new(3, "安息香酸"), 5.0, ExemptionType::Carryover);

        let summary = AdditiveSummary::new(
            vec![
                carryover,
                merged(preservative, 1.0, ExemptionType::Required),
                emulsifier,
            ],
            Utc::now(),
        );

        assert_eq!(
            format_additive_display(&summary),
            "／保存料（ソルビン酸K），乳化剤（大豆）"
        );
    }

    #[test]
    fn test_additive_display_dedupes_rendered_entries() {
        let summary = AdditiveSummary::new(
            vec![
                merged(
                    AdditiveInfo::new(1, "バニリン").with_collective_name("flavor"),
                    2.0,
                    ExemptionType::Required,
                ),
                merged(AdditiveInfo::new(2, "グリシン"), 1.5, ExemptionType::Required),
                merged(
                    AdditiveInfo::new(3, "エチルバニリン").with_collective_name("香料"),
                    1.0,
                    ExemptionType::Required,
                ),
            ],
            Utc::now(),
        );

        assert_eq!(format_additive_display(&summary), "／香料，グリシン");
    }

    #[test]
    fn test_additive_display_empty() {
        let only_exempt = AdditiveSummary::new(
            vec![merged(AdditiveInfo::new(1, "安息香酸"), 1.0, ExemptionType::ProcessingAid)],
            Utc::now(),
        );
        assert_eq!(format_additive_display(&only_exempt), "");
        assert_eq!(format_additive_display(&AdditiveSummary::new(vec![], Utc::now())), "");
    }

    #[test]
    fn test_allergen_policies() {
        let summary = AllergenSummary::new(
            vec![
                allergen(AllergenItem::Soybean, 0.6),
                allergen(AllergenItem::Wheat, 0.3),
                allergen(AllergenItem::Egg, 0.1),
            ],
            Utc::now(),
        );

        assert_eq!(
            format_allergen_display(&summary, AllergenDisplayPolicy::MandatoryFirst),
            vec!["小麦", "卵", "大豆"]
        );
        assert_eq!(
            format_allergen_display(&summary, AllergenDisplayPolicy::MandatoryOnly),
            vec!["小麦", "卵"]
        );
        assert_eq!(
            format_allergen_display(&summary, AllergenDisplayPolicy::WeightOrder),
            vec!["大豆", "小麦", "卵"]
        );
    }

    #[test]
    fn test_allergen_statement() {
        let summary = AllergenSummary::new(
            vec![
                allergen(AllergenItem::Wheat, 0.5),
                allergen(AllergenItem::Egg, 0.2),
                allergen(AllergenItem::Milk, 0.1),
            ],
            Utc::now(),
        );

        assert_eq!(
            allergen_statement(&summary, AllergenDisplayPolicy::default()),
            "（一部に小麦・卵・乳成分を含む）"
        );
        assert_eq!(
            allergen_statement(&AllergenSummary::new(vec![], Utc::now()), AllergenDisplayPolicy::default()),
            ""
        );
    }

    #[test]
    fn test_nutrition_facts() {
        let nutrients = NutrientVector::new()
            .with(NutrientCode::Energy, 170.4)
            .with(NutrientCode::Protein, 7.04)
            .with(NutrientCode::Sodium, 100.0);

        assert_eq!(
            format_nutrition_facts(&nutrients),
            vec![
                "エネルギー 170kcal",
                "たんぱく質 7.0g",
                "脂質 -",
                "炭水化物 -",
                "食塩相当量 0.25g",
            ]
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "mandatory_only".parse::<AllergenDisplayPolicy>(),
            Ok(AllergenDisplayPolicy::MandatoryOnly)
        );
        assert!("alphabetical".parse::<AllergenDisplayPolicy>().is_err());
    }
}
