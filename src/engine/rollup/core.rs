use crate::config::EngineConfig;
use crate::domain::composition::{
    merge_leaves, CompositionLink, CompositionNode, InputMode, LeafContribution, NodeBody,
};
use crate::domain::nutrient::NutrientVector;
use crate::domain::types::{ComponentKind, NodeKey, NodeKind};
use crate::engine::cancel::CancellationToken;
use crate::engine::collaborators::ChildResolver;
use crate::engine::error::{EngineError, EngineResult, GuardKind, ReferenceKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};

// ==========================================
// RollupOutput - 展开结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupOutput {
    pub nutrients: NutrientVector,     // 加权汇总后 (每 100g)
    pub leaves: Vec<LeafContribution>, // 展开后的叶子 (按遍历顺序,未合并)
    pub stats: RollupStats,
}

impl RollupOutput {
    /// 按原材料ID合并后的叶子 (ID 升序)
    pub fn merged_leaves(&self) -> Vec<LeafContribution> {
        merge_leaves(&self.leaves)
    }
}

/// 展开统计 (用于日志/诊断)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RollupStats {
    pub visited_nodes: usize, // 访问节点数 (含记忆化命中的子树)
    pub max_depth: usize,     // 到达的最大深度 (根为 0)
    pub memo_hits: usize,     // 记忆化命中次数
}

// ==========================================
// RollupEngine - 配合展开引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct RollupEngine {
    max_depth: usize,
    max_nodes: usize,
    memoize: bool,
}

impl Default for RollupEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RollupEngine {
    /// 构造函数 (默认上限)
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// 按配置构造
    ///
    /// # 参数
    /// - `config`: 引擎配置 (max_depth / max_nodes / memoize)
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_nodes: config.max_nodes,
            memoize: config.memoize,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 展开根节点 (顶层重量 1,不可取消)
    pub fn rollup(
        &self,
        root: &CompositionNode,
        resolver: &dyn ChildResolver,
    ) -> EngineResult<RollupOutput> {
        self.rollup_with(root, resolver, 1.0, &CancellationToken::new())
    }

    /// 展开根节点
    ///
    /// # 参数
    /// - `root`: 根节点 (任意类型)
    /// - `resolver`: 子项解析器
    /// - `top_weight`: 顶层重量,只作用于叶子的有效重量,营养成分仍为每 100g
    /// - `token`: 取消标记,每次节点访问前检查
    ///
    /// # 返回
    /// - Ok(RollupOutput)
    /// - Err: 循环/超限/无效配合/缺失引用/取消/协作者失败
    pub fn rollup_with(
        &self,
        root: &CompositionNode,
        resolver: &dyn ChildResolver,
        top_weight: f64,
        token: &CancellationToken,
    ) -> EngineResult<RollupOutput> {
        if !top_weight.is_finite() || top_weight < 0.0 {
            return Err(EngineError::invalid(
                root.key(),
                format!("顶层重量无效: {}", top_weight),
            ));
        }

        debug!(root = %root.key(), top_weight, "开始配合展开");

        let mut traversal = Traversal {
            engine: self,
            resolver,
            token,
            path: Vec::new(),
            on_path: HashSet::new(),
            memo: HashMap::new(),
            stats: RollupStats::default(),
        };

        let visited = traversal.visit(root, 0)?;
        let stats = traversal.stats;

        let leaves = visited
            .output
            .leaves
            .iter()
            .map(|leaf| LeafContribution::new(leaf.raw_material_id, leaf.effective_weight * top_weight))
            .collect();

        debug!(
            root = %root.key(),
            visited_nodes = stats.visited_nodes,
            max_depth = stats.max_depth,
            memo_hits = stats.memo_hits,
            "配合展开完成"
        );

        Ok(RollupOutput {
            nutrients: visited.output.nutrients.clone(),
            leaves,
            stats,
        })
    }

    /// 计算复合节点各配合行的有效比例
    ///
    /// 规则:
    /// - 比例方式: 有效比例 = mixing_ratio (0 <= ratio <= 1,合计不必为 1)
    /// - 重量方式: 有效比例 = weight / Σweight (Σweight 必须 > 0)
    /// - 每行必须恰好引用一个子项
    pub fn link_fractions(
        &self,
        node: NodeKey,
        input_mode: InputMode,
        links: &[CompositionLink],
    ) -> EngineResult<Vec<(ComponentKind, i64, f64)>> {
        if links.is_empty() {
            return Err(EngineError::invalid(node, "复合节点没有配合行"));
        }

        let mut children = Vec::with_capacity(links.len());
        let mut amounts = Vec::with_capacity(links.len());

        for (seq, link) in links.iter().enumerate() {
            let line = seq + 1;
            let child = link
                .child()
                .map_err(|reason| EngineError::invalid(node, format!("第{}行: {}", line, reason)))?;

            let amount = match input_mode {
                InputMode::Ratio => link.mixing_ratio.ok_or_else(|| {
                    EngineError::invalid(node, format!("第{}行缺少配合比例", line))
                })?,
                InputMode::Weight => link.weight.ok_or_else(|| {
                    EngineError::invalid(node, format!("第{}行缺少配合重量", line))
                })?,
            };

            if !amount.is_finite() {
                return Err(EngineError::invalid(
                    node,
                    format!("第{}行配合量不是有限数值", line),
                ));
            }
            if amount < 0.0 {
                return Err(EngineError::invalid(
                    node,
                    format!("第{}行配合量为负数: {}", line, amount),
                ));
            }
            if input_mode == InputMode::Ratio && amount > 1.0 {
                return Err(EngineError::invalid(
                    node,
                    format!("第{}行配合比例超过 1: {}", line, amount),
                ));
            }

            children.push(child);
            amounts.push(amount);
        }

        let fractions: Vec<f64> = match input_mode {
            InputMode::Ratio => amounts,
            InputMode::Weight => {
                let total: f64 = amounts.iter().sum();
                if total <= 0.0 {
                    return Err(EngineError::invalid(node, "配合总重量为 0"));
                }
                amounts.iter().map(|w| w / total).collect()
            }
        };

        Ok(children
            .into_iter()
            .zip(fractions)
            .map(|((kind, id), fraction)| (kind, id, fraction))
            .collect())
    }
}

// ==========================================
// Traversal - 单次展开的遍历状态
// ==========================================

/// 已展开子树 (有效重量按 1 归一)
#[derive(Clone)]
struct Visited {
    output: Rc<RollupOutput>,
    height: usize, // 子树高度 (叶子为 0)
    nodes: usize,  // 子树节点数 (含自身)
}

struct Traversal<'a> {
    engine: &'a RollupEngine,
    resolver: &'a dyn ChildResolver,
    token: &'a CancellationToken,
    path: Vec<NodeKey>,
    on_path: HashSet<NodeKey>,
    memo: HashMap<NodeKey, Visited>,
    stats: RollupStats,
}

impl<'a> Traversal<'a> {
    /// 访问节点 (深度优先)
    fn visit(&mut self, node: &CompositionNode, depth: usize) -> EngineResult<Visited> {
        self.token.check()?;
        self.enter(node.key(), depth, 1)?;

        match &node.body {
            NodeBody::Leaf { nutrients } => {
                if node.kind != NodeKind::RawMaterial {
                    return Err(EngineError::invalid(node.key(), "复合类型节点没有配合行"));
                }
                trace!(node = %node.key(), depth, "叶子节点");
                Ok(Visited {
                    output: Rc::new(RollupOutput {
                        nutrients: nutrients.clone(),
                        leaves: vec![LeafContribution::new(node.id, 1.0)],
                        stats: RollupStats::default(),
                    }),
                    height: 0,
                    nodes: 1,
                })
            }
            NodeBody::Composite { input_mode, links } => {
                if node.kind == NodeKind::RawMaterial {
                    return Err(EngineError::invalid(node.key(), "原材料不能包含配合行"));
                }
                self.visit_composite(node.key(), *input_mode, links, depth)
            }
        }
    }

    fn visit_composite(
        &mut self,
        key: NodeKey,
        input_mode: InputMode,
        links: &[CompositionLink],
        depth: usize,
    ) -> EngineResult<Visited> {
        if self.on_path.contains(&key) {
            return Err(self.cycle_error(key));
        }

        let fractions = self.engine.link_fractions(key, input_mode, links)?;
        trace!(node = %key, depth, links = fractions.len(), "展开复合节点");

        self.path.push(key);
        self.on_path.insert(key);

        let mut nutrients = NutrientVector::new();
        let mut leaves = Vec::new();
        let mut height = 0;
        let mut nodes = 1;
        let mut contributors: Vec<Rc<RollupOutput>> = Vec::new();

        for (kind, id, fraction) in fractions {
            let child = self.child(kind, id, depth + 1)?;
            nutrients.accumulate(&child.output.nutrients, fraction);
            if fraction > 0.0 {
                contributors.push(Rc::clone(&child.output));
            }
            leaves.extend(child.output.leaves.iter().map(|leaf| {
                LeafContribution::new(leaf.raw_material_id, leaf.effective_weight * fraction)
            }));
            height = height.max(child.height + 1);
            nodes += child.nodes;
        }

        self.path.pop();
        self.on_path.remove(&key);

        // 任一有效子项未知的字段不能视为完整数据
        let sources: Vec<&NutrientVector> =
            contributors.iter().map(|output| &output.nutrients).collect();
        nutrients.mark_partial_coverage(&sources);

        Ok(Visited {
            output: Rc::new(RollupOutput {
                nutrients,
                leaves,
                stats: RollupStats::default(),
            }),
            height,
            nodes,
        })
    }

    /// 解析并展开子项 (含记忆化)
    fn child(&mut self, kind: ComponentKind, id: i64, depth: usize) -> EngineResult<Visited> {
        let key = NodeKey::new(kind.node_kind(), id);

        if self.on_path.contains(&key) {
            return Err(self.cycle_error(key));
        }

        if self.engine.memoize {
            if let Some(hit) = self.memo.get(&key).cloned() {
                self.token.check()?;
                // 命中的子树按完整展开计入深度与节点数,保证上限判定与不缓存时一致
                self.enter(key, depth + hit.height, hit.nodes)?;
                self.stats.memo_hits += 1;
                trace!(node = %key, depth, "记忆化命中");
                return Ok(hit);
            }
        }

        let node = self.resolver.resolve(kind, id)?.ok_or(EngineError::MissingReference {
            entity: ReferenceKind::from(kind.node_kind()),
            id,
        })?;

        if node.key() != key {
            return Err(EngineError::invalid(
                key,
                format!("解析结果与引用不一致: {}", node.key()),
            ));
        }

        let visited = self.visit(&node, depth)?;
        if self.engine.memoize {
            self.memo.insert(key, visited.clone());
        }
        Ok(visited)
    }

    /// 记录访问并检查上限
    fn enter(&mut self, key: NodeKey, depth: usize, nodes: usize) -> EngineResult<()> {
        if depth > self.engine.max_depth {
            return Err(EngineError::CompositionTooLarge {
                guard: GuardKind::Depth,
                limit: self.engine.max_depth,
                node: key,
            });
        }

        self.stats.visited_nodes += nodes;
        self.stats.max_depth = self.stats.max_depth.max(depth);

        if self.stats.visited_nodes > self.engine.max_nodes {
            return Err(EngineError::CompositionTooLarge {
                guard: GuardKind::NodeCount,
                limit: self.engine.max_nodes,
                node: key,
            });
        }
        Ok(())
    }

    /// 构造循环错误: 从首次出现位置到重复节点
    fn cycle_error(&self, key: NodeKey) -> EngineError {
        let start = self.path.iter().position(|k| *k == key).unwrap_or(0);
        let mut path: Vec<NodeKey> = self.path[start..].to_vec();
        path.push(key);
        EngineError::CompositionCycle { path }
    }
}
