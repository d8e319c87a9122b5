// ==========================================
// 食品表示引擎 - 配合展开引擎
// ==========================================
// 职责: 展开复合节点的配合树,按比例/重量加权汇总营养成分,
//       并输出展开后的 (原材料ID, 有效重量) 列表
// 输入: 根节点 + ChildResolver
// 输出: RollupOutput
// ==========================================
// 红线: 显式路径追踪检测循环,不依赖调用栈溢出
// 红线: 深度/节点数上限可配置,超限即失败
// 红线: 引擎无跨请求状态;记忆化缓存仅在单次请求内有效
// ==========================================

mod core;

#[cfg(test)]
mod tests;

pub use self::core::{RollupEngine, RollupOutput, RollupStats};
