// ==========================================
// 食品表示引擎 - 营养成分向量
// ==========================================
// 职责: 固定 schema 的营养成分记录 (约 50 项) + 品质标记
// 红线: 未设置的字段表示"未知",与 0 不同
// 红线: 仅有数据与算术,不含遍历/表示逻辑
// ==========================================

use crate::domain::types::QualityFlag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 钠(mg) → 食塩相当量(g) 换算系数
pub const SODIUM_TO_SALT_FACTOR: f64 = 2.54 / 1000.0;

// 营养成分目录: 变体 => (machine key, 表示名, 单位)
macro_rules! nutrient_codes {
    ($($variant:ident => ($key:literal, $name:literal, $unit:literal)),+ $(,)?) => {
        /// 营养成分代码 (固定枚举)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum NutrientCode {
            $(#[serde(rename = $key)] $variant),+
        }

        impl NutrientCode {
            /// 全部营养成分代码 (声明顺序)
            pub const ALL: &'static [NutrientCode] = &[$(NutrientCode::$variant),+];

            pub fn key(&self) -> &'static str {
                match self {
                    $(NutrientCode::$variant => $key),+
                }
            }

            pub fn display_name(&self) -> &'static str {
                match self {
                    $(NutrientCode::$variant => $name),+
                }
            }

            pub fn unit(&self) -> &'static str {
                match self {
                    $(NutrientCode::$variant => $unit),+
                }
            }

            /// 按 machine key 查找
            pub fn from_key(key: &str) -> Option<NutrientCode> {
                match key.trim() {
                    $($key => Some(NutrientCode::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

nutrient_codes! {
    // ===== 能量 =====
    Energy => ("energy", "エネルギー", "kcal"),
    EnergyKj => ("energy_kj", "エネルギー(kJ)", "kJ"),
    Water => ("water", "水分", "g"),
    // ===== 三大营养素 =====
    Protein => ("protein", "たんぱく質", "g"),
    ProteinAmino => ("protein_amino", "アミノ酸組成によるたんぱく質", "g"),
    Fat => ("fat", "脂質", "g"),
    FatTriacylglycerol => ("fat_tag", "トリアシルグリセロール当量", "g"),
    SaturatedFat => ("saturated_fat", "飽和脂肪酸", "g"),
    MonounsaturatedFat => ("monounsaturated_fat", "一価不飽和脂肪酸", "g"),
    PolyunsaturatedFat => ("polyunsaturated_fat", "多価不飽和脂肪酸", "g"),
    TransFat => ("trans_fat", "トランス脂肪酸", "g"),
    Cholesterol => ("cholesterol", "コレステロール", "mg"),
    Carbohydrate => ("carbohydrate", "炭水化物", "g"),
    AvailableCarbohydrate => ("available_carbohydrate", "利用可能炭水化物", "g"),
    Sugars => ("sugars", "糖類", "g"),
    DietaryFiber => ("dietary_fiber", "食物繊維", "g"),
    SolubleFiber => ("soluble_fiber", "水溶性食物繊維", "g"),
    InsolubleFiber => ("insoluble_fiber", "不溶性食物繊維", "g"),
    SugarAlcohol => ("sugar_alcohol", "糖アルコール", "g"),
    Alcohol => ("alcohol", "アルコール", "g"),
    Ash => ("ash", "灰分", "g"),
    // ===== 无机质 =====
    Sodium => ("sodium", "ナトリウム", "mg"),
    SaltEquivalent => ("salt_equivalent", "食塩相当量", "g"),
    Potassium => ("potassium", "カリウム", "mg"),
    Calcium => ("calcium", "カルシウム", "mg"),
    Magnesium => ("magnesium", "マグネシウム", "mg"),
    Phosphorus => ("phosphorus", "リン", "mg"),
    Iron => ("iron", "鉄", "mg"),
    Zinc => ("zinc", "亜鉛", "mg"),
    Copper => ("copper", "銅", "mg"),
    Manganese => ("manganese", "マンガン", "mg"),
    Iodine => ("iodine", "ヨウ素", "µg"),
    Selenium => ("selenium", "セレン", "µg"),
    Chromium => ("chromium", "クロム", "µg"),
    Molybdenum => ("molybdenum", "モリブデン", "µg"),
    // ===== 维生素 =====
    VitaminA => ("vitamin_a", "ビタミンA", "µg"),
    Retinol => ("retinol", "レチノール", "µg"),
    BetaCarotene => ("beta_carotene", "β-カロテン", "µg"),
    VitaminD => ("vitamin_d", "ビタミンD", "µg"),
    VitaminE => ("vitamin_e", "ビタミンE", "mg"),
    VitaminK => ("vitamin_k", "ビタミンK", "µg"),
    VitaminB1 => ("vitamin_b1", "ビタミンB1", "mg"),
    VitaminB2 => ("vitamin_b2", "ビタミンB2", "mg"),
    Niacin => ("niacin", "ナイアシン", "mg"),
    VitaminB6 => ("vitamin_b6", "ビタミンB6", "mg"),
    VitaminB12 => ("vitamin_b12", "ビタミンB12", "µg"),
    Folate => ("folate", "葉酸", "µg"),
    PantothenicAcid => ("pantothenic_acid", "パントテン酸", "mg"),
    Biotin => ("biotin", "ビオチン", "µg"),
    VitaminC => ("vitamin_c", "ビタミンC", "mg"),
}

impl fmt::Display for NutrientCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// ==========================================
// NutrientValue - 单项营养成分值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientValue {
    pub value: f64,                   // 每 100g 含量
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityFlag>, // 品质标记 (可选)
}

impl NutrientValue {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            quality: None,
        }
    }

    pub fn with_quality(value: f64, quality: QualityFlag) -> Self {
        Self {
            value,
            quality: Some(quality),
        }
    }
}

// ==========================================
// NutrientVector - 营养成分向量
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NutrientVector {
    values: BTreeMap<NutrientCode, NutrientValue>,
}

impl NutrientVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式设置数值 (无品质标记)
    pub fn with(mut self, code: NutrientCode, value: f64) -> Self {
        self.set(code, NutrientValue::new(value));
        self
    }

    /// 链式设置数值 + 品质标记
    pub fn with_quality(mut self, code: NutrientCode, value: f64, quality: QualityFlag) -> Self {
        self.set(code, NutrientValue::with_quality(value, quality));
        self
    }

    pub fn set(&mut self, code: NutrientCode, value: NutrientValue) {
        self.values.insert(code, value);
    }

    /// 清除字段 (回到"未知")
    pub fn clear(&mut self, code: NutrientCode) {
        self.values.remove(&code);
    }

    pub fn get(&self, code: NutrientCode) -> Option<&NutrientValue> {
        self.values.get(&code)
    }

    pub fn value(&self, code: NutrientCode) -> Option<f64> {
        self.values.get(&code).map(|v| v.value)
    }

    pub fn quality(&self, code: NutrientCode) -> Option<QualityFlag> {
        self.values.get(&code).and_then(|v| v.quality)
    }

    pub fn is_known(&self, code: NutrientCode) -> bool {
        self.values.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NutrientCode, &NutrientValue)> {
        self.values.iter().map(|(code, value)| (*code, value))
    }

    /// 按系数缩放,返回新向量 (品质标记保持)
    pub fn scaled(&self, factor: f64) -> NutrientVector {
        let values = self
            .values
            .iter()
            .map(|(code, v)| {
                (
                    *code,
                    NutrientValue {
                        value: v.value * factor,
                        quality: v.quality,
                    },
                )
            })
            .collect();
        NutrientVector { values }
    }

    /// 累加 `other * factor` 到自身
    ///
    /// # 规则
    /// - 仅对 other 中已知的字段累加;双方都未知的字段保持未知
    /// - 品质标记按 `QualityFlag::combine` 合并,缺失的标记不参与合并
    /// - 仅部分来源已知的字段由调用方通过 `mark_partial_coverage` 降级
    pub fn accumulate(&mut self, other: &NutrientVector, factor: f64) {
        for (code, incoming) in &other.values {
            let contribution = incoming.value * factor;
            match self.values.get_mut(code) {
                Some(existing) => {
                    existing.value += contribution;
                    existing.quality = match (existing.quality, incoming.quality) {
                        (Some(a), Some(b)) => Some(a.combine(b)),
                        (Some(a), None) => Some(a),
                        (None, b) => b,
                    };
                }
                None => {
                    self.values.insert(
                        *code,
                        NutrientValue {
                            value: contribution,
                            quality: incoming.quality,
                        },
                    );
                }
            }
        }
    }

    /// 将已知字段中未被 `sources` 全部覆盖的字段标记为 NOT_MEASURED
    ///
    /// 数值保留已知部分的合计,仅降级品质标记
    pub fn mark_partial_coverage(&mut self, sources: &[&NutrientVector]) {
        for (code, value) in self.values.iter_mut() {
            if sources.iter().any(|source| !source.is_known(*code)) {
                value.quality = Some(QualityFlag::NotMeasured);
            }
        }
    }

    /// 食塩相当量 (g)
    ///
    /// 已设置 SaltEquivalent 时直接返回;否则由 Sodium(mg) 换算
    pub fn salt_equivalent(&self) -> Option<f64> {
        self.value(NutrientCode::SaltEquivalent)
            .or_else(|| self.value(NutrientCode::Sodium).map(|na| na * SODIUM_TO_SALT_FACTOR))
    }
}
