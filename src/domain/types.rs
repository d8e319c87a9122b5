// ==========================================
// 食品表示引擎 - 领域类型定义
// ==========================================
// 职责: 配合层级、品质标记、添加物豁免/用途/一括名等封闭枚举
// 红线: 固定目录一律使用封闭枚举 + 查表,不使用开放字符串键
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 节点类型 (Node Kind)
// ==========================================
// 原材料为叶子;仕掛品/半製品为复合节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    RawMaterial,         // 原材料
    PreProduct,          // 仕掛品
    SemiFinishedProduct, // 半製品
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::RawMaterial => "RAW_MATERIAL",
            NodeKind::PreProduct => "PRE_PRODUCT",
            NodeKind::SemiFinishedProduct => "SEMI_FINISHED_PRODUCT",
        }
    }

    /// 是否为复合节点
    pub fn is_composite(&self) -> bool {
        !matches!(self, NodeKind::RawMaterial)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "RAW_MATERIAL" => Ok(NodeKind::RawMaterial),
            "PRE_PRODUCT" => Ok(NodeKind::PreProduct),
            "SEMI_FINISHED_PRODUCT" => Ok(NodeKind::SemiFinishedProduct),
            other => Err(format!("未知节点类型: {}", other)),
        }
    }
}

// ==========================================
// 配合子项类型 (Component Kind)
// ==========================================
// 配合行只能引用原材料或仕掛品,半製品不会作为子项出现
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentKind {
    RawMaterial,
    PreProduct,
}

impl ComponentKind {
    pub fn node_kind(&self) -> NodeKind {
        match self {
            ComponentKind::RawMaterial => NodeKind::RawMaterial,
            ComponentKind::PreProduct => NodeKind::PreProduct,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node_kind())
    }
}

// ==========================================
// 节点键 (Node Key)
// ==========================================
// 不同类型的节点可能共用同一数值ID,因此以 (类型, ID) 作为身份
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeKey {
    pub kind: NodeKind,
    pub id: i64,
}

impl NodeKey {
    pub fn new(kind: NodeKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn raw_material(id: i64) -> Self {
        Self::new(NodeKind::RawMaterial, id)
    }

    pub fn pre_product(id: i64) -> Self {
        Self::new(NodeKind::PreProduct, id)
    }

    pub fn semi_finished(id: i64) -> Self {
        Self::new(NodeKind::SemiFinishedProduct, id)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

// ==========================================
// 数据品质标记 (Quality Flag)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityFlag {
    Measured,    // 实测值
    Estimated,   // 推定值
    Calculated,  // 计算值
    NotMeasured, // 未测定
    Trace,       // 微量
}

impl QualityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::Measured => "MEASURED",
            QualityFlag::Estimated => "ESTIMATED",
            QualityFlag::Calculated => "CALCULATED",
            QualityFlag::NotMeasured => "NOT_MEASURED",
            QualityFlag::Trace => "TRACE",
        }
    }

    /// 合并两个来源的品质标记
    ///
    /// 规则:
    /// 1) 任一为 NOT_MEASURED → NOT_MEASURED
    /// 2) 两者相同 → 保持
    /// 3) 其他 → CALCULATED
    pub fn combine(self, other: QualityFlag) -> QualityFlag {
        if self == QualityFlag::NotMeasured || other == QualityFlag::NotMeasured {
            QualityFlag::NotMeasured
        } else if self == other {
            self
        } else {
            QualityFlag::Calculated
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QualityFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MEASURED" => Ok(QualityFlag::Measured),
            "ESTIMATED" => Ok(QualityFlag::Estimated),
            "CALCULATED" => Ok(QualityFlag::Calculated),
            "NOT_MEASURED" => Ok(QualityFlag::NotMeasured),
            "TRACE" => Ok(QualityFlag::Trace),
            other => Err(format!("未知品质标记: {}", other)),
        }
    }
}

// ==========================================
// 添加物豁免类型 (Exemption Type)
// ==========================================
// 顺序: Required < Carryover < ProcessingAid < NutrientFortifier
// 越靠前越需要表示,合并时取最靠前者
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExemptionType {
    Required,          // 需要表示
    Carryover,         // キャリーオーバー
    ProcessingAid,     // 加工助剤
    NutrientFortifier, // 栄養強化剤
}

impl ExemptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExemptionType::Required => "REQUIRED",
            ExemptionType::Carryover => "CARRYOVER",
            ExemptionType::ProcessingAid => "PROCESSING_AID",
            ExemptionType::NutrientFortifier => "NUTRIENT_FORTIFIER",
        }
    }

    /// 是否需要在表示文中出现
    pub fn is_displayable(&self) -> bool {
        matches!(self, ExemptionType::Required)
    }

    /// 合并: 取更需要表示的一方
    pub fn most_disclosing(self, other: ExemptionType) -> ExemptionType {
        self.min(other)
    }
}

impl fmt::Display for ExemptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ExemptionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "REQUIRED" => Ok(ExemptionType::Required),
            "CARRYOVER" => Ok(ExemptionType::Carryover),
            "PROCESSING_AID" => Ok(ExemptionType::ProcessingAid),
            "NUTRIENT_FORTIFIER" => Ok(ExemptionType::NutrientFortifier),
            other => Err(format!("未知豁免类型: {}", other)),
        }
    }
}

// ==========================================
// 用途分类 (Purpose Category)
// ==========================================
// 前 8 组属于用途名併記对象,其余用途不併記
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurposeCategory {
    Sweetener,     // 甘味料
    Colorant,      // 着色料
    Preservative,  // 保存料
    Thickener,     // 増粘剤
    Stabilizer,    // 安定剤
    GellingAgent,  // ゲル化剤
    Paste,         // 糊料
    Antioxidant,   // 酸化防止剤
    ColorFixative, // 発色剤
    Bleach,        // 漂白剤
    Fungicide,     // 防かび剤
    Other,         // 其他用途
}

impl PurposeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurposeCategory::Sweetener => "SWEETENER",
            PurposeCategory::Colorant => "COLORANT",
            PurposeCategory::Preservative => "PRESERVATIVE",
            PurposeCategory::Thickener => "THICKENER",
            PurposeCategory::Stabilizer => "STABILIZER",
            PurposeCategory::GellingAgent => "GELLING_AGENT",
            PurposeCategory::Paste => "PASTE",
            PurposeCategory::Antioxidant => "ANTIOXIDANT",
            PurposeCategory::ColorFixative => "COLOR_FIXATIVE",
            PurposeCategory::Bleach => "BLEACH",
            PurposeCategory::Fungicide => "FUNGICIDE",
            PurposeCategory::Other => "OTHER",
        }
    }

    /// 表示用的用途名
    pub fn display_name(&self) -> Option<&'static str> {
        match self {
            PurposeCategory::Sweetener => Some("甘味料"),
            PurposeCategory::Colorant => Some("着色料"),
            PurposeCategory::Preservative => Some("保存料"),
            PurposeCategory::Thickener => Some("増粘剤"),
            PurposeCategory::Stabilizer => Some("安定剤"),
            PurposeCategory::GellingAgent => Some("ゲル化剤"),
            PurposeCategory::Paste => Some("糊料"),
            PurposeCategory::Antioxidant => Some("酸化防止剤"),
            PurposeCategory::ColorFixative => Some("発色剤"),
            PurposeCategory::Bleach => Some("漂白剤"),
            PurposeCategory::Fungicide => Some("防かび剤"),
            PurposeCategory::Other => None,
        }
    }

    /// 是否属于用途名併記对象
    pub fn supports_co_display(&self) -> bool {
        self.display_name().is_some()
    }
}

impl fmt::Display for PurposeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PurposeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SWEETENER" => Ok(PurposeCategory::Sweetener),
            "COLORANT" => Ok(PurposeCategory::Colorant),
            "PRESERVATIVE" => Ok(PurposeCategory::Preservative),
            "THICKENER" => Ok(PurposeCategory::Thickener),
            "STABILIZER" => Ok(PurposeCategory::Stabilizer),
            "GELLING_AGENT" => Ok(PurposeCategory::GellingAgent),
            "PASTE" => Ok(PurposeCategory::Paste),
            "ANTIOXIDANT" => Ok(PurposeCategory::Antioxidant),
            "COLOR_FIXATIVE" => Ok(PurposeCategory::ColorFixative),
            "BLEACH" => Ok(PurposeCategory::Bleach),
            "FUNGICIDE" => Ok(PurposeCategory::Fungicide),
            "OTHER" => Ok(PurposeCategory::Other),
            other => Err(format!("未知用途分类: {}", other)),
        }
    }
}

// ==========================================
// 一括名 (Collective Name)
// ==========================================
// 法定一括名 14 种,添加物数据中以 machine key 引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectiveName {
    YeastFood,       // イーストフード
    GumBase,         // ガムベース
    Kansui,          // かんすい
    Bittering,       // 苦味料
    Enzyme,          // 酵素
    Glazing,         // 光沢剤
    Flavor,          // 香料
    Acidulant,       // 酸味料
    GumSoftener,     // チューインガム軟化剤
    Seasoning,       // 調味料
    TofuCoagulant,   // 豆腐用凝固剤
    Emulsifier,      // 乳化剤
    PhAdjuster,      // pH調整剤
    LeaveningAgent,  // 膨脹剤
}

impl CollectiveName {
    pub const ALL: [CollectiveName; 14] = [
        CollectiveName::YeastFood,
        CollectiveName::GumBase,
        CollectiveName::Kansui,
        CollectiveName::Bittering,
        CollectiveName::Enzyme,
        CollectiveName::Glazing,
        CollectiveName::Flavor,
        CollectiveName::Acidulant,
        CollectiveName::GumSoftener,
        CollectiveName::Seasoning,
        CollectiveName::TofuCoagulant,
        CollectiveName::Emulsifier,
        CollectiveName::PhAdjuster,
        CollectiveName::LeaveningAgent,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CollectiveName::YeastFood => "yeast_food",
            CollectiveName::GumBase => "gum_base",
            CollectiveName::Kansui => "kansui",
            CollectiveName::Bittering => "bittering",
            CollectiveName::Enzyme => "enzyme",
            CollectiveName::Glazing => "glazing",
            CollectiveName::Flavor => "flavor",
            CollectiveName::Acidulant => "acidulant",
            CollectiveName::GumSoftener => "gum_softener",
            CollectiveName::Seasoning => "seasoning",
            CollectiveName::TofuCoagulant => "tofu_coagulant",
            CollectiveName::Emulsifier => "emulsifier",
            CollectiveName::PhAdjuster => "ph_adjuster",
            CollectiveName::LeaveningAgent => "leavening_agent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CollectiveName::YeastFood => "イーストフード",
            CollectiveName::GumBase => "ガムベース",
            CollectiveName::Kansui => "かんすい",
            CollectiveName::Bittering => "苦味料",
            CollectiveName::Enzyme => "酵素",
            CollectiveName::Glazing => "光沢剤",
            CollectiveName::Flavor => "香料",
            CollectiveName::Acidulant => "酸味料",
            CollectiveName::GumSoftener => "チューインガム軟化剤",
            CollectiveName::Seasoning => "調味料",
            CollectiveName::TofuCoagulant => "豆腐用凝固剤",
            CollectiveName::Emulsifier => "乳化剤",
            CollectiveName::PhAdjuster => "pH調整剤",
            CollectiveName::LeaveningAgent => "膨脹剤",
        }
    }

    /// 按 machine key 或表示名查找一括名
    ///
    /// # 返回
    /// - Some: 有效的一括名
    /// - None: 不在法定目录中
    pub fn lookup(code: &str) -> Option<CollectiveName> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        CollectiveName::ALL
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(code) || c.display_name() == code)
    }
}

impl fmt::Display for CollectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
