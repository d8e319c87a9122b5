use super::*;
use crate::config::EngineConfig;
use crate::domain::composition::{CompositionLink, CompositionNode, InputMode};
use crate::domain::nutrient::{NutrientCode, NutrientVector};
use crate::domain::types::{ComponentKind, NodeKey, QualityFlag};
use crate::engine::cancel::CancellationToken;
use crate::engine::collaborators::{ChildResolver, InMemoryCompositionStore, LookupError, LookupResult};
use crate::engine::error::{EngineError, GuardKind, ReferenceKind};
use std::sync::atomic::{AtomicUsize, Ordering};

// ==========================================
// 测试辅助函数
// ==========================================

fn raw(id: i64, energy: f64, protein: f64) -> CompositionNode {
    CompositionNode::raw_material(
        id,
        NutrientVector::new()
            .with(NutrientCode::Energy, energy)
            .with(NutrientCode::Protein, protein),
    )
}

fn rm(id: i64, ratio: f64) -> CompositionLink {
    CompositionLink::ratio(ComponentKind::RawMaterial, id, ratio)
}

fn pp(id: i64, ratio: f64) -> CompositionLink {
    CompositionLink::ratio(ComponentKind::PreProduct, id, ratio)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// 创建测试用的存储: 原材料 1 (200kcal/10g) 与 2 (100kcal/0g)
fn create_test_store() -> InMemoryCompositionStore {
    let mut store = InMemoryCompositionStore::new();
    store.insert_node(raw(1, 200.0, 10.0));
    store.insert_node(raw(2, 100.0, 0.0));
    store
}

/// 构造深度为 `depth` 的仕掛品链: PP#1 -> PP#2 -> ... -> RM#1
fn create_chain_store(depth: i64) -> InMemoryCompositionStore {
    let mut store = create_test_store();
    for id in 1..depth {
        store.insert_node(CompositionNode::pre_product(id, InputMode::Ratio, vec![pp(id + 1, 1.0)]));
    }
    store.insert_node(CompositionNode::pre_product(depth, InputMode::Ratio, vec![rm(1, 1.0)]));
    store
}

/// 统计解析次数的包装
struct CountingResolver {
    inner: InMemoryCompositionStore,
    calls: AtomicUsize,
}

impl ChildResolver for CountingResolver {
    fn resolve(&self, kind: ComponentKind, id: i64) -> LookupResult<CompositionNode> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(kind, id)
    }
}

/// 总是失败的解析器
struct FailingResolver;

impl ChildResolver for FailingResolver {
    fn resolve(&self, _kind: ComponentKind, _id: i64) -> LookupResult<CompositionNode> {
        Err(LookupError::Unavailable("connection refused".to_string()))
    }
}

// ==========================================
// 基本展开
// ==========================================

#[test]
fn test_leaf_root_returns_own_vector() {
    let store = create_test_store();
    let engine = RollupEngine::new();
    let root = raw(1, 200.0, 10.0);

    let output = engine.rollup(&root, &store).unwrap();

    assert_eq!(output.nutrients, root_nutrients(&root));
    assert_eq!(output.leaves.len(), 1);
    assert_eq!(output.leaves[0].raw_material_id, 1);
    assert_eq!(output.leaves[0].effective_weight, 1.0);
}

fn root_nutrients(node: &CompositionNode) -> NutrientVector {
    match &node.body {
        crate::domain::composition::NodeBody::Leaf { nutrients } => nutrients.clone(),
        _ => NutrientVector::new(),
    }
}

#[test]
fn test_single_child_full_ratio_is_exact() {
    let mut store = InMemoryCompositionStore::new();
    let leaf = CompositionNode::raw_material(
        1,
        NutrientVector::new()
            .with_quality(NutrientCode::Energy, 123.456789, QualityFlag::Measured)
            .with(NutrientCode::Sodium, 0.1),
    );
    store.insert_node(leaf.clone());
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 1.0)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();

    assert_eq!(output.nutrients, root_nutrients(&leaf));
}

#[test]
fn test_end_to_end_weighted_sum() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.7), rm(2, 0.3)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();

    assert!(approx(output.nutrients.value(NutrientCode::Energy).unwrap(), 170.0));
    assert!(approx(output.nutrients.value(NutrientCode::Protein).unwrap(), 7.0));
    assert_eq!(output.nutrients.value(NutrientCode::Fat), None);

    let leaves = output.merged_leaves();
    assert_eq!(leaves.len(), 2);
    assert!(approx(leaves[0].effective_weight, 0.7));
    assert!(approx(leaves[1].effective_weight, 0.3));
}

#[test]
fn test_nested_fractions_multiply() {
    let mut store = create_test_store();
    store.insert_node(CompositionNode::pre_product(20, InputMode::Ratio, vec![rm(1, 0.5), rm(2, 0.5)]));
    let root = CompositionNode::semi_finished(30, InputMode::Ratio, vec![pp(20, 0.4), rm(1, 0.6)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();
    let leaves = output.merged_leaves();

    // RM#1 = 0.4*0.5 + 0.6 = 0.8, RM#2 = 0.4*0.5 = 0.2
    assert!(approx(leaves[0].effective_weight, 0.8));
    assert!(approx(leaves[1].effective_weight, 0.2));
    assert!(approx(output.nutrients.value(NutrientCode::Energy).unwrap(), 0.8 * 200.0 + 0.2 * 100.0));
    assert_eq!(output.stats.max_depth, 2);
}

#[test]
fn test_ratios_need_not_sum_to_one() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.5), rm(2, 0.2)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();

    assert!(approx(output.nutrients.value(NutrientCode::Energy).unwrap(), 120.0));
}

#[test]
fn test_zero_ratio_contributes_nothing() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 1.0), rm(2, 0.0)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();

    assert!(approx(output.nutrients.value(NutrientCode::Energy).unwrap(), 200.0));
    assert_eq!(output.leaves.len(), 2);
    assert_eq!(output.leaves[1].effective_weight, 0.0);
}

#[test]
fn test_weight_mode_matches_ratio_mode() {
    let store = create_test_store();
    let by_weight = CompositionNode::pre_product(
        10,
        InputMode::Weight,
        vec![
            CompositionLink::weight(ComponentKind::RawMaterial, 1, 60.0),
            CompositionLink::weight(ComponentKind::RawMaterial, 2, 40.0),
        ],
    );
    let by_ratio = CompositionNode::pre_product(11, InputMode::Ratio, vec![rm(1, 0.6), rm(2, 0.4)]);

    let engine = RollupEngine::new();
    let a = engine.rollup(&by_weight, &store).unwrap();
    let b = engine.rollup(&by_ratio, &store).unwrap();

    assert!(approx(
        a.nutrients.value(NutrientCode::Energy).unwrap(),
        b.nutrients.value(NutrientCode::Energy).unwrap()
    ));
    for (x, y) in a.merged_leaves().iter().zip(b.merged_leaves().iter()) {
        assert_eq!(x.raw_material_id, y.raw_material_id);
        assert!(approx(x.effective_weight, y.effective_weight));
    }
}

#[test]
fn test_top_weight_scales_leaves_only() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.7), rm(2, 0.3)]);

    let output = RollupEngine::new()
        .rollup_with(&root, &store, 250.0, &CancellationToken::new())
        .unwrap();

    assert!(approx(output.nutrients.value(NutrientCode::Energy).unwrap(), 170.0));
    assert!(approx(output.leaves[0].effective_weight, 175.0));
    assert!(approx(output.leaves[1].effective_weight, 75.0));
}

#[test]
fn test_shared_subtree_counted_per_path() {
    let mut store = create_test_store();
    store.insert_node(CompositionNode::pre_product(20, InputMode::Ratio, vec![rm(1, 1.0)]));
    store.insert_node(CompositionNode::pre_product(21, InputMode::Ratio, vec![pp(20, 1.0)]));
    let root = CompositionNode::semi_finished(30, InputMode::Ratio, vec![pp(20, 0.5), pp(21, 0.5)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();

    let leaves = output.merged_leaves();
    assert_eq!(leaves.len(), 1);
    assert!(approx(leaves[0].effective_weight, 1.0));
    assert_eq!(output.leaves.len(), 2);
}

// ==========================================
// 品质标记
// ==========================================

#[test]
fn test_quality_not_measured_propagates() {
    let mut store = InMemoryCompositionStore::new();
    store.insert_node(CompositionNode::raw_material(
        1,
        NutrientVector::new().with_quality(NutrientCode::Iron, 2.0, QualityFlag::Measured),
    ));
    store.insert_node(CompositionNode::raw_material(
        2,
        NutrientVector::new().with_quality(NutrientCode::Iron, 1.0, QualityFlag::NotMeasured),
    ));
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.5), rm(2, 0.5)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();

    assert_eq!(output.nutrients.quality(NutrientCode::Iron), Some(QualityFlag::NotMeasured));
    assert!(approx(output.nutrients.value(NutrientCode::Iron).unwrap(), 1.5));
}

#[test]
fn test_partially_known_field_is_not_measured() {
    let mut store = InMemoryCompositionStore::new();
    store.insert_node(CompositionNode::raw_material(
        1,
        NutrientVector::new()
            .with_quality(NutrientCode::Energy, 200.0, QualityFlag::Measured)
            .with_quality(NutrientCode::Protein, 10.0, QualityFlag::Measured),
    ));
    store.insert_node(CompositionNode::raw_material(
        2,
        NutrientVector::new().with_quality(NutrientCode::Protein, 4.0, QualityFlag::Measured),
    ));
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.5), rm(2, 0.5)]);

    let output = RollupEngine::new().rollup(&root, &store).unwrap();

    // RM#2 的能量未知: 保留已知部分,品质降为 NOT_MEASURED
    let energy = output.nutrients.get(NutrientCode::Energy).unwrap();
    assert!(approx(energy.value, 100.0));
    assert_eq!(energy.quality, Some(QualityFlag::NotMeasured));

    // 双方都已知的字段保持原品质
    assert!(approx(output.nutrients.value(NutrientCode::Protein).unwrap(), 7.0));
    assert_eq!(output.nutrients.quality(NutrientCode::Protein), Some(QualityFlag::Measured));

    // 双方都未知的字段保持未知
    assert!(!output.nutrients.is_known(NutrientCode::Fat));
}

#[test]
fn test_partial_coverage_ignores_zero_fraction_and_propagates_upward() {
    let mut store = InMemoryCompositionStore::new();
    store.insert_node(CompositionNode::raw_material(
        1,
        NutrientVector::new().with_quality(NutrientCode::Energy, 200.0, QualityFlag::Measured),
    ));
    store.insert_node(CompositionNode::raw_material(2, NutrientVector::new()));
    store.insert_node(CompositionNode::raw_material(
        3,
        NutrientVector::new().with_quality(NutrientCode::Energy, 100.0, QualityFlag::Measured),
    ));
    // RM#2 比率为 0,不影响品质
    store.insert_node(CompositionNode::pre_product(20, InputMode::Ratio, vec![rm(1, 1.0), rm(2, 0.0)]));
    // RM#2 参与配合,能量降级
    store.insert_node(CompositionNode::pre_product(21, InputMode::Ratio, vec![rm(3, 0.5), rm(2, 0.5)]));

    let engine = RollupEngine::new();
    let full = engine
        .rollup(&store.node(NodeKey::pre_product(20)).cloned().unwrap(), &store)
        .unwrap();
    assert_eq!(full.nutrients.quality(NutrientCode::Energy), Some(QualityFlag::Measured));

    let root = CompositionNode::semi_finished(30, InputMode::Ratio, vec![pp(20, 0.5), pp(21, 0.5)]);
    let output = engine.rollup(&root, &store).unwrap();
    assert!(approx(output.nutrients.value(NutrientCode::Energy).unwrap(), 125.0));
    assert_eq!(output.nutrients.quality(NutrientCode::Energy), Some(QualityFlag::NotMeasured));
}

// ==========================================
// 循环检测
// ==========================================

#[test]
fn test_two_node_cycle_from_either_root() {
    let mut store = create_test_store();
    store.insert_node(CompositionNode::pre_product(1, InputMode::Ratio, vec![pp(2, 1.0)]));
    store.insert_node(CompositionNode::pre_product(2, InputMode::Ratio, vec![pp(1, 1.0)]));
    let engine = RollupEngine::new();

    for (start, other) in [(1, 2), (2, 1)] {
        let root = store.node(NodeKey::pre_product(start)).unwrap().clone();
        match engine.rollup(&root, &store) {
            Err(EngineError::CompositionCycle { path }) => {
                assert_eq!(
                    path,
                    vec![
                        NodeKey::pre_product(start),
                        NodeKey::pre_product(other),
                        NodeKey::pre_product(start)
                    ]
                );
            }
            other => panic!("应检测到循环,实际: {:?}", other),
        }
    }
}

#[test]
fn test_self_reference_is_cycle() {
    let mut store = create_test_store();
    store.insert_node(CompositionNode::pre_product(5, InputMode::Ratio, vec![rm(1, 0.5), pp(5, 0.5)]));
    let root = store.node(NodeKey::pre_product(5)).unwrap().clone();

    let err = RollupEngine::new().rollup(&root, &store).unwrap_err();

    assert!(matches!(err, EngineError::CompositionCycle { ref path } if path.len() == 2));
}

#[test]
fn test_cycle_below_root_reports_cycle_only() {
    let mut store = create_test_store();
    store.insert_node(CompositionNode::pre_product(1, InputMode::Ratio, vec![pp(2, 1.0)]));
    store.insert_node(CompositionNode::pre_product(2, InputMode::Ratio, vec![pp(3, 1.0)]));
    store.insert_node(CompositionNode::pre_product(3, InputMode::Ratio, vec![pp(2, 1.0)]));
    let root = CompositionNode::semi_finished(9, InputMode::Ratio, vec![pp(1, 1.0)]);

    let err = RollupEngine::new().rollup(&root, &store).unwrap_err();

    match err {
        EngineError::CompositionCycle { path } => assert_eq!(
            path,
            vec![NodeKey::pre_product(2), NodeKey::pre_product(3), NodeKey::pre_product(2)]
        ),
        other => panic!("应检测到循环,实际: {:?}", other),
    }
}

// ==========================================
// 无效配合
// ==========================================

#[test]
fn test_negative_ratio_is_invalid() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, -0.1)]);

    let err = RollupEngine::new().rollup(&root, &store).unwrap_err();

    assert!(matches!(err, EngineError::InvalidComposition { node, .. } if node == NodeKey::pre_product(10)));
}

#[test]
fn test_ratio_above_one_is_invalid() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 1.5)]);

    assert!(matches!(
        RollupEngine::new().rollup(&root, &store),
        Err(EngineError::InvalidComposition { .. })
    ));
}

#[test]
fn test_zero_total_weight_is_invalid() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(
        10,
        InputMode::Weight,
        vec![
            CompositionLink::weight(ComponentKind::RawMaterial, 1, 0.0),
            CompositionLink::weight(ComponentKind::RawMaterial, 2, 0.0),
        ],
    );

    assert!(matches!(
        RollupEngine::new().rollup(&root, &store),
        Err(EngineError::InvalidComposition { .. })
    ));
}

#[test]
fn test_link_with_both_or_neither_reference_is_invalid() {
    let store = create_test_store();
    let engine = RollupEngine::new();

    let both = CompositionLink {
        raw_material_id: Some(1),
        pre_product_id: Some(2),
        mixing_ratio: Some(1.0),
        ..Default::default()
    };
    let neither = CompositionLink {
        mixing_ratio: Some(1.0),
        ..Default::default()
    };

    for link in [both, neither] {
        let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![link]);
        assert!(matches!(
            engine.rollup(&root, &store),
            Err(EngineError::InvalidComposition { .. })
        ));
    }
}

#[test]
fn test_missing_amount_for_mode_is_invalid() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(
        10,
        InputMode::Ratio,
        vec![CompositionLink::weight(ComponentKind::RawMaterial, 1, 50.0)],
    );

    assert!(matches!(
        RollupEngine::new().rollup(&root, &store),
        Err(EngineError::InvalidComposition { .. })
    ));
}

#[test]
fn test_empty_composite_is_invalid() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![]);

    assert!(matches!(
        RollupEngine::new().rollup(&root, &store),
        Err(EngineError::InvalidComposition { .. })
    ));
}

#[test]
fn test_link_fractions_normalize_weights() {
    let engine = RollupEngine::new();
    let fractions = engine
        .link_fractions(
            NodeKey::pre_product(1),
            InputMode::Weight,
            &[
                CompositionLink::weight(ComponentKind::RawMaterial, 1, 30.0),
                CompositionLink::weight(ComponentKind::PreProduct, 2, 10.0),
            ],
        )
        .unwrap();

    assert_eq!(fractions[0].0, ComponentKind::RawMaterial);
    assert!(approx(fractions[0].2, 0.75));
    assert_eq!(fractions[1].0, ComponentKind::PreProduct);
    assert!(approx(fractions[1].2, 0.25));
}

// ==========================================
// 缺失引用 / 协作者失败
// ==========================================

#[test]
fn test_missing_child_is_reported() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.5), pp(99, 0.5)]);

    let err = RollupEngine::new().rollup(&root, &store).unwrap_err();

    assert!(matches!(
        err,
        EngineError::MissingReference {
            entity: ReferenceKind::PreProduct,
            id: 99
        }
    ));
}

#[test]
fn test_lookup_failure_is_propagated() {
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 1.0)]);

    let err = RollupEngine::new().rollup(&root, &FailingResolver).unwrap_err();

    assert!(matches!(err, EngineError::Lookup(LookupError::Unavailable(_))));
}

// ==========================================
// 规模上限
// ==========================================

#[test]
fn test_depth_guard() {
    let store = create_chain_store(5);
    let root = store.node(NodeKey::pre_product(1)).unwrap().clone();

    let config = EngineConfig {
        max_depth: 4,
        ..EngineConfig::default()
    };
    let err = RollupEngine::with_config(&config).rollup(&root, &store).unwrap_err();
    assert!(matches!(
        err,
        EngineError::CompositionTooLarge {
            guard: GuardKind::Depth,
            limit: 4,
            ..
        }
    ));

    // 深度 5 (根为 0) 恰好在上限内
    let config = EngineConfig {
        max_depth: 5,
        ..EngineConfig::default()
    };
    assert!(RollupEngine::with_config(&config).rollup(&root, &store).is_ok());
}

#[test]
fn test_node_count_guard() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.3), rm(2, 0.3), rm(1, 0.4)]);

    let config = EngineConfig {
        max_nodes: 3,
        ..EngineConfig::default()
    };
    let err = RollupEngine::with_config(&config).rollup(&root, &store).unwrap_err();
    assert!(matches!(
        err,
        EngineError::CompositionTooLarge {
            guard: GuardKind::NodeCount,
            limit: 3,
            ..
        }
    ));

    let config = EngineConfig {
        max_nodes: 4,
        ..EngineConfig::default()
    };
    let output = RollupEngine::with_config(&config).rollup(&root, &store).unwrap();
    assert_eq!(output.stats.visited_nodes, 4);
}

#[test]
fn test_deep_chain_does_not_overflow() {
    let store = create_chain_store(2000);
    let root = store.node(NodeKey::pre_product(1)).unwrap().clone();

    let err = RollupEngine::new().rollup(&root, &store).unwrap_err();

    assert!(matches!(
        err,
        EngineError::CompositionTooLarge {
            guard: GuardKind::Depth,
            ..
        }
    ));
}

// ==========================================
// 记忆化
// ==========================================

/// 菱形共享结构: 根 -> {PP#20, PP#21},二者都引用 PP#22
fn create_diamond_store() -> InMemoryCompositionStore {
    let mut store = create_test_store();
    store.insert_node(CompositionNode::pre_product(22, InputMode::Ratio, vec![rm(1, 0.5), rm(2, 0.5)]));
    store.insert_node(CompositionNode::pre_product(20, InputMode::Ratio, vec![pp(22, 1.0)]));
    store.insert_node(CompositionNode::pre_product(21, InputMode::Ratio, vec![pp(22, 0.5), rm(1, 0.5)]));
    store
}

#[test]
fn test_memoization_equivalent_and_resolves_once() {
    let root = CompositionNode::semi_finished(30, InputMode::Ratio, vec![pp(20, 0.5), pp(21, 0.5)]);

    let memo_resolver = CountingResolver {
        inner: create_diamond_store(),
        calls: AtomicUsize::new(0),
    };
    let plain_resolver = CountingResolver {
        inner: create_diamond_store(),
        calls: AtomicUsize::new(0),
    };

    let memo = RollupEngine::new().rollup(&root, &memo_resolver).unwrap();
    let plain = RollupEngine::with_config(&EngineConfig {
        memoize: false,
        ..EngineConfig::default()
    })
    .rollup(&root, &plain_resolver)
    .unwrap();

    assert_eq!(memo.nutrients, plain.nutrients);
    assert_eq!(memo.leaves, plain.leaves);
    assert_eq!(memo.stats.visited_nodes, plain.stats.visited_nodes);
    assert_eq!(memo.stats.max_depth, plain.stats.max_depth);
    assert!(memo.stats.memo_hits >= 1);
    assert_eq!(plain.stats.memo_hits, 0);
    assert!(
        memo_resolver.calls.load(Ordering::SeqCst) < plain_resolver.calls.load(Ordering::SeqCst)
    );
}

#[test]
fn test_memo_hit_respects_guards() {
    let store = create_diamond_store();
    let root = CompositionNode::semi_finished(30, InputMode::Ratio, vec![pp(20, 0.5), pp(21, 0.5)]);

    let plain = RollupEngine::with_config(&EngineConfig {
        memoize: false,
        ..EngineConfig::default()
    })
    .rollup(&root, &store)
    .unwrap();
    let limit = plain.stats.visited_nodes - 1;

    for memoize in [true, false] {
        let config = EngineConfig {
            max_nodes: limit,
            memoize,
            ..EngineConfig::default()
        };
        assert!(matches!(
            RollupEngine::with_config(&config).rollup(&root, &store),
            Err(EngineError::CompositionTooLarge {
                guard: GuardKind::NodeCount,
                ..
            })
        ));
    }
}

// ==========================================
// 取消
// ==========================================

#[test]
fn test_cancelled_token_stops_rollup() {
    let store = create_test_store();
    let root = CompositionNode::pre_product(10, InputMode::Ratio, vec![rm(1, 0.7), rm(2, 0.3)]);
    let token = CancellationToken::new();
    token.cancel();

    let err = RollupEngine::new()
        .rollup_with(&root, &store, 1.0, &token)
        .unwrap_err();

    assert!(matches!(err, EngineError::Cancelled));
}

#[test]
fn test_engine_is_reusable_after_error() {
    let store = create_test_store();
    let engine = RollupEngine::new();
    let bad = CompositionNode::pre_product(10, InputMode::Ratio, vec![pp(99, 1.0)]);
    let good = CompositionNode::pre_product(11, InputMode::Ratio, vec![rm(1, 1.0)]);

    assert!(engine.rollup(&bad, &store).is_err());
    assert!(engine.rollup(&good, &store).is_ok());
}
