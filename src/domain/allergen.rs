// ==========================================
// 食品表示引擎 - 过敏原领域模型
// ==========================================
// 职责: 30 槽位过敏原标记、静态过敏原目录、合并结果与汇总
// 红线: 特定原材料 8 品目由法规固定,运行期不可变更
// 红线: 第 30 槽位为预留,不参与聚合
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 过敏原标记槽位数
pub const ALLERGEN_SLOT_COUNT: usize = 30;

/// 已命名的目录条目数 (索引 1..=29)
pub const NAMED_ALLERGEN_COUNT: usize = 29;

// ==========================================
// AllergenItem - 过敏原品目
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergenItem {
    // ===== 特定原材料 (义务表示) =====
    Shrimp,
    Crab,
    Wheat,
    Buckwheat,
    Egg,
    Milk,
    Peanut,
    Walnut,
    // ===== 特定原材料に準ずるもの (推奖表示) =====
    Almond,
    Abalone,
    Squid,
    SalmonRoe,
    Orange,
    Cashew,
    Kiwi,
    Beef,
    Sesame,
    Salmon,
    Mackerel,
    Soybean,
    Chicken,
    Banana,
    Pork,
    Matsutake,
    Peach,
    Yam,
    Apple,
    Gelatin,
    Macadamia,
}

// ==========================================
// AllergenCatalogEntry - 目录条目
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllergenCatalogEntry {
    pub index: u8,                  // 槽位索引 (1 起)
    pub item: AllergenItem,
    pub display_name: &'static str, // 表示名
    pub key: &'static str,          // machine key
    pub mandatory: bool,            // 是否义务表示
}

const fn entry(
    index: u8,
    item: AllergenItem,
    display_name: &'static str,
    key: &'static str,
    mandatory: bool,
) -> AllergenCatalogEntry {
    AllergenCatalogEntry {
        index,
        item,
        display_name,
        key,
        mandatory,
    }
}

static CATALOG: [AllergenCatalogEntry; NAMED_ALLERGEN_COUNT] = [
    entry(1, AllergenItem::Shrimp, "えび", "shrimp", true),
    entry(2, AllergenItem::Crab, "かに", "crab", true),
    entry(3, AllergenItem::Wheat, "小麦", "wheat", true),
    entry(4, AllergenItem::Buckwheat, "そば", "buckwheat", true),
    entry(5, AllergenItem::Egg, "卵", "egg", true),
    entry(6, AllergenItem::Milk, "乳成分", "milk", true),
    entry(7, AllergenItem::Peanut, "落花生", "peanut", true),
    entry(8, AllergenItem::Walnut, "くるみ", "walnut", true),
    entry(9, AllergenItem::Almond, "アーモンド", "almond", false),
    entry(10, AllergenItem::Abalone, "あわび", "abalone", false),
    entry(11, AllergenItem::Squid, "いか", "squid", false),
    entry(12, AllergenItem::SalmonRoe, "いくら", "salmon_roe", false),
    entry(13, AllergenItem::Orange, "オレンジ", "orange", false),
    entry(14, AllergenItem::Cashew, "カシューナッツ", "cashew", false),
    entry(15, AllergenItem::Kiwi, "キウイフルーツ", "kiwi", false),
    entry(16, AllergenItem::Beef, "牛肉", "beef", false),
    entry(17, AllergenItem::Sesame, "ごま", "sesame", false),
    entry(18, AllergenItem::Salmon, "さけ", "salmon", false),
    entry(19, AllergenItem::Mackerel, "さば", "mackerel", false),
    entry(20, AllergenItem::Soybean, "大豆", "soybean", false),
    entry(21, AllergenItem::Chicken, "鶏肉", "chicken", false),
    entry(22, AllergenItem::Banana, "バナナ", "banana", false),
    entry(23, AllergenItem::Pork, "豚肉", "pork", false),
    entry(24, AllergenItem::Matsutake, "まつたけ", "matsutake", false),
    entry(25, AllergenItem::Peach, "もも", "peach", false),
    entry(26, AllergenItem::Yam, "やまいも", "yam", false),
    entry(27, AllergenItem::Apple, "りんご", "apple", false),
    entry(28, AllergenItem::Gelatin, "ゼラチン", "gelatin", false),
    entry(29, AllergenItem::Macadamia, "マカダミアナッツ", "macadamia", false),
];

// ==========================================
// AllergenCatalog - 静态过敏原目录
// ==========================================
// 进程级只读数据,无需初始化
pub struct AllergenCatalog;

impl AllergenCatalog {
    /// 全部已命名条目 (按索引升序)
    pub fn entries() -> &'static [AllergenCatalogEntry] {
        &CATALOG
    }

    /// 按槽位索引查找 (1..=29);预留槽位与越界返回 None
    pub fn by_index(index: u8) -> Option<&'static AllergenCatalogEntry> {
        if index == 0 {
            return None;
        }
        CATALOG.get(index as usize - 1)
    }

    pub fn by_item(item: AllergenItem) -> &'static AllergenCatalogEntry {
        // CATALOG 与 AllergenItem 声明顺序一致
        &CATALOG[item as usize]
    }

    pub fn by_key(key: &str) -> Option<&'static AllergenCatalogEntry> {
        CATALOG.iter().find(|e| e.key == key.trim())
    }

    /// 义务表示的 8 品目
    pub fn mandatory() -> impl Iterator<Item = &'static AllergenCatalogEntry> {
        CATALOG.iter().filter(|e| e.mandatory)
    }
}

impl AllergenItem {
    pub fn catalog_entry(&self) -> &'static AllergenCatalogEntry {
        AllergenCatalog::by_item(*self)
    }

    pub fn index(&self) -> u8 {
        self.catalog_entry().index
    }

    pub fn is_mandatory(&self) -> bool {
        self.catalog_entry().mandatory
    }
}

impl fmt::Display for AllergenItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.catalog_entry().display_name)
    }
}

// ==========================================
// AllergenFlags - 原材料过敏原标记
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllergenFlags([bool; ALLERGEN_SLOT_COUNT]);

impl AllergenFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slots(slots: [bool; ALLERGEN_SLOT_COUNT]) -> Self {
        Self(slots)
    }

    pub fn from_items(items: &[AllergenItem]) -> Self {
        let mut flags = Self::new();
        for item in items {
            flags.set_item(*item);
        }
        flags
    }

    pub fn set_item(&mut self, item: AllergenItem) {
        self.0[item.index() as usize - 1] = true;
    }

    /// 按槽位索引设置 (1..=30);越界返回 false
    pub fn set_index(&mut self, index: u8) -> bool {
        match (index as usize).checked_sub(1) {
            Some(slot) if slot < ALLERGEN_SLOT_COUNT => {
                self.0[slot] = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_set(&self, index: u8) -> bool {
        match (index as usize).checked_sub(1) {
            Some(slot) if slot < ALLERGEN_SLOT_COUNT => self.0[slot],
            _ => false,
        }
    }

    pub fn slots(&self) -> &[bool; ALLERGEN_SLOT_COUNT] {
        &self.0
    }

    /// 已标记的目录条目 (跳过预留槽位)
    pub fn flagged(&self) -> impl Iterator<Item = &'static AllergenCatalogEntry> + '_ {
        AllergenCatalog::entries()
            .iter()
            .filter(move |e| self.is_set(e.index))
    }
}

// ==========================================
// MergedAllergen - 合并后的过敏原
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedAllergen {
    pub index: u8,
    pub item: AllergenItem,
    pub display_name: String,
    pub key: String,
    pub mandatory: bool,
    pub total_weight: f64, // 仅用于排序,不表示含量
}

// ==========================================
// AllergenSummary - 过敏原汇总
// ==========================================
// 构造后不可变;按合计重量降序,同重量按目录索引升序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllergenSummary {
    items: Vec<MergedAllergen>,
    computed_at: DateTime<Utc>,
}

impl AllergenSummary {
    pub fn new(items: Vec<MergedAllergen>, computed_at: DateTime<Utc>) -> Self {
        Self { items, computed_at }
    }

    pub fn items(&self) -> &[MergedAllergen] {
        &self.items
    }

    pub fn mandatory(&self) -> impl Iterator<Item = &MergedAllergen> {
        self.items.iter().filter(|item| item.mandatory)
    }

    pub fn non_mandatory(&self) -> impl Iterator<Item = &MergedAllergen> {
        self.items.iter().filter(|item| !item.mandatory)
    }

    pub fn computed_at(&self) -> DateTime<Utc> {
        self.computed_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, item: AllergenItem) -> Option<&MergedAllergen> {
        self.items.iter().find(|m| m.item == item)
    }
}
