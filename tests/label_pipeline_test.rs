// ==========================================
// 表示生成流水线集成测试
// ==========================================
// 测试范围:
// 1. 多层配合 (比例/重量混合) 的营养成分展开
// 2. 添加物/过敏原基于同一叶子集合汇总
// 3. 表示文与过敏原表示策略
// 4. 结构错误与缺失引用
// ==========================================


use food_label_engine::config::EngineConfig;
use food_label_engine::domain::types::QualityFlag;
use food_label_engine::domain::{merge_leaves, AllergenItem, NodeKey, NutrientCode};
use food_label_engine::engine::{
    AllergenDisplayPolicy, CancellationToken, EngineError, LabelOrchestrator, ReferenceKind,
};
use test_helpers::*;

fn generate(policy: AllergenDisplayPolicy) -> food_label_engine::domain::LabelResult {
    let sources = curry_fixture().memory_sources();
    let orchestrator = LabelOrchestrator::new(EngineConfig {
        allergen_display_policy: policy,
        ..EngineConfig::default()
    });
    orchestrator
        .generate_for(NodeKey::semi_finished(CURRY_ID), &sources, &CancellationToken::new())
        .expect("生成失败")
}

// ==========================================
// 营养成分
// ==========================================

#[test]
fn test_curry_nutrients_多层混合配合() {
    let result = generate(AllergenDisplayPolicy::MandatoryFirst);

    assert!(approx_eq(result.nutrients.value(NutrientCode::Energy).unwrap(), 262.0));
    assert!(approx_eq(result.nutrients.value(NutrientCode::Protein).unwrap(), 6.82));
    assert!(approx_eq(result.nutrients.value(NutrientCode::Fat).unwrap(), 4.12));
    assert!(approx_eq(result.nutrients.value(NutrientCode::Carbohydrate).unwrap(), 49.1));
    assert!(approx_eq(result.nutrients.value(NutrientCode::Sodium).unwrap(), 1578.4));
    // 任何原材料都未设置的成分保持未知
    assert_eq!(result.nutrients.value(NutrientCode::VitaminC), None);
    // 食塩 (RM#3) 没有蛋白质数据: 合计只是已知部分,品质为未测定
    assert_eq!(
        result.nutrients.quality(NutrientCode::Protein),
        Some(QualityFlag::NotMeasured)
    );
    // 全部原材料都有能量数据: 不附加品质标记
    assert_eq!(result.nutrients.quality(NutrientCode::Energy), None);

    assert_eq!(
        result.nutrition_facts,
        vec![
            "エネルギー 262kcal",
            "たんぱく質 6.8g",
            "脂質 4.1g",
            "炭水化物 49.1g",
            "食塩相当量 4.01g",
        ]
    );
}

#[test]
fn test_curry_leaves_合计为1() {
    let result = generate(AllergenDisplayPolicy::MandatoryFirst);

    let merged = merge_leaves(&result.leaves);
    let weights: Vec<(i64, f64)> = merged
        .iter()
        .map(|l| (l.raw_material_id, l.effective_weight))
        .collect();

    assert_eq!(weights.len(), 4);
    let expected = [
        (FLOUR_ID, 0.5),
        (MILK_ID, 0.3),
        (SALT_ID, 0.04),
        (CURRY_POWDER_ID, 0.16),
    ];
    for ((id, weight), (expected_id, expected_weight)) in weights.iter().zip(expected.iter()) {
        assert_eq!(id, expected_id);
        assert!(approx_eq(*weight, *expected_weight), "RM#{} 权重 {}", id, weight);
    }

    let total: f64 = result.leaves.iter().map(|l| l.effective_weight).sum();
    assert!(approx_eq(total, 1.0));
}

// ==========================================
// 添加物
// ==========================================

#[test]
fn test_curry_additives_豁免项不表示() {
    let result = generate(AllergenDisplayPolicy::MandatoryFirst);

    let items = result.additive_summary.items();
    assert_eq!(items.len(), 3, "豁免项仍保留在汇总中");
    assert_eq!(items[0].additive_id(), SORBATE_ID);
    assert!(approx_eq(items[0].total_weight, 0.0008));
    assert_eq!(items[1].additive_id(), GLUTAMATE_ID);
    assert!(approx_eq(items[1].total_weight, 0.0004));
    assert_eq!(items[2].additive_id(), LECITHIN_ID);
    assert_eq!(items[2].allergen_origins, vec!["乳".to_string()]);

    assert_eq!(result.additive_display, "／保存料（ソルビン酸K），調味料");
}

// ==========================================
// 过敏原
// ==========================================

#[test]
fn test_curry_allergens_按重量排序() {
    let result = generate(AllergenDisplayPolicy::WeightOrder);

    let items = result.allergen_summary.items();
    let order: Vec<AllergenItem> = items.iter().map(|m| m.item).collect();
    assert_eq!(
        order,
        vec![AllergenItem::Wheat, AllergenItem::Milk, AllergenItem::Soybean]
    );
    assert!(approx_eq(items[0].total_weight, 0.66));
    assert!(approx_eq(items[1].total_weight, 0.3));
    assert!(approx_eq(items[2].total_weight, 0.16));

    assert_eq!(result.allergen_display, vec!["小麦", "乳成分", "大豆"]);
    assert_eq!(result.allergen_statement, "（一部に小麦・乳成分・大豆を含む）");
}

#[test]
fn test_curry_allergens_仅义务项() {
    let result = generate(AllergenDisplayPolicy::MandatoryOnly);

    assert_eq!(result.allergen_display, vec!["小麦", "乳成分"]);
    assert_eq!(result.allergen_statement, "（一部に小麦・乳成分を含む）");
    // 汇总本身不受表示策略影响
    assert!(result.allergen_summary.find(AllergenItem::Soybean).is_some());
}

// ==========================================
// 中间节点作为根
// ==========================================

#[test]
fn test_pre_product_as_root() {
    let sources = curry_fixture().memory_sources();

    let result = LabelOrchestrator::default()
        .generate_for(NodeKey::pre_product(SAUCE_ID), &sources, &CancellationToken::new())
        .expect("生成失败");

    // 60% 牛乳 + 40% 食塩
    assert!(approx_eq(result.nutrients.value(NutrientCode::Energy).unwrap(), 36.0));
    assert!(approx_eq(result.nutrients.value(NutrientCode::Sodium).unwrap(), 15624.0));
    assert_eq!(result.additive_display, "／調味料");
    assert_eq!(result.allergen_display, vec!["乳成分"]);
}

// ==========================================
// 错误路径
// ==========================================

#[test]
fn test_cycle_rejected_无部分结果() {
    let sources = cycle_fixture().memory_sources();

    let err = LabelOrchestrator::default()
        .generate_for(NodeKey::pre_product(1), &sources, &CancellationToken::new())
        .unwrap_err();

    match err {
        EngineError::CompositionCycle { path } => {
            assert_eq!(
                path,
                vec![
                    NodeKey::pre_product(1),
                    NodeKey::pre_product(2),
                    NodeKey::pre_product(1)
                ]
            );
        }
        other => panic!("Expected CompositionCycle, got {:?}", other),
    }
}

#[test]
fn test_missing_additive_catalog_entry() {
    let mut fixture = curry_fixture();
    fixture.additives.retain(|a| a.additive_id != GLUTAMATE_ID);
    let sources = fixture.memory_sources();

    let err = LabelOrchestrator::default()
        .generate_for(NodeKey::semi_finished(CURRY_ID), &sources, &CancellationToken::new())
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::MissingReference {
            entity: ReferenceKind::Additive,
            id: GLUTAMATE_ID
        }
    ));
}

#[test]
fn test_missing_child_node() {
    let mut fixture = curry_fixture();
    fixture.nodes.retain(|n| n.key() != NodeKey::pre_product(ROUX_ID));
    let sources = fixture.memory_sources();

    let err = LabelOrchestrator::default()
        .generate_for(NodeKey::semi_finished(CURRY_ID), &sources, &CancellationToken::new())
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::MissingReference {
            entity: ReferenceKind::PreProduct,
            id: ROUX_ID
        }
    ));
}

#[test]
fn test_repeated_generation_is_deterministic() {
    let first = generate(AllergenDisplayPolicy::MandatoryFirst);
    let second = generate(AllergenDisplayPolicy::MandatoryFirst);

    assert_ne!(first.result_id, second.result_id);
    assert_eq!(first.nutrients, second.nutrients);
    assert_eq!(first.leaves, second.leaves);
    assert_eq!(first.additive_display, second.additive_display);
    assert_eq!(first.allergen_display, second.allergen_display);
}
