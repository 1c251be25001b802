//! 查询谓词生成
//!
//! 把规则树翻译为参数化的查询片段，每个原子规则一条，按从左到右的遍历顺序排列。
//!
//! 生成器只收集扁平的原子片段：组合规则的 AND/OR 以及括号都不会写入结果。
//! 调用方如果要拼出完整的布尔表达式，需要自己结合规则树的结构处理优先级和括号，
//! 并决定目标查询语言的占位符写法（如 `@p0`、`:p0`）。

use crate::models::{AtomicRule, CompositeRule, RuleNode};
use crate::visitor::RuleVisitor;
use rule_shared::observability::metrics;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// 单个谓词片段
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateFragment {
    /// `"<属性键> <操作符> <占位符>"`
    pub fragment: String,
    /// 占位符名称 → 期望值
    pub parameters: HashMap<String, Value>,
}

/// 谓词生成器
///
/// 占位符 `p0`、`p1`…… 按遍历顺序分配，在同一个生成器实例内严格递增、永不复用。
/// 复用同一个生成器处理多棵树时编号会接续而不是重置；需要隔离时为每棵树新建生成器。
#[derive(Debug, Default)]
pub struct PredicateGenerator {
    counter: usize,
}

impl PredicateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 生成规则树的谓词片段
    pub fn generate(&mut self, rule: &RuleNode) -> Vec<PredicateFragment> {
        let first = self.counter;
        let fragments = rule.accept(self);

        debug!(
            fragment_count = fragments.len(),
            first_placeholder = first,
            next_placeholder = self.counter,
            "谓词片段生成完成"
        );
        metrics::record_predicate_generation(fragments.len());
        fragments
    }

    /// 下一个将被分配的占位符序号
    pub fn next_index(&self) -> usize {
        self.counter
    }

    fn next_placeholder(&mut self) -> String {
        let placeholder = format!("p{}", self.counter);
        self.counter += 1;
        placeholder
    }
}

impl RuleVisitor for PredicateGenerator {
    type Output = Vec<PredicateFragment>;

    fn visit_atomic(&mut self, rule: &AtomicRule) -> Vec<PredicateFragment> {
        let placeholder = self.next_placeholder();
        let fragment = format!("{} {} {}", rule.property_key, rule.operator, placeholder);

        let mut parameters = HashMap::with_capacity(1);
        parameters.insert(placeholder, rule.expected.clone());

        vec![PredicateFragment {
            fragment,
            parameters,
        }]
    }

    fn visit_composite(&mut self, rule: &CompositeRule) -> Vec<PredicateFragment> {
        let mut fragments = Vec::new();
        for child in &rule.children {
            fragments.extend(child.accept(self));
        }
        fragments
    }
}
