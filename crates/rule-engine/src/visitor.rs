//! 规则访问者
//!
//! 同一棵规则树可以有多种解释（直接评估、生成查询谓词、收集字段……）。
//! 每种解释实现一次 [`RuleVisitor`]，由 [`RuleNode::accept`] 按节点类型分派，
//! 访问者的返回值原样沿调用链向上传递。新增解释不需要修改规则模型。

use crate::models::{AtomicRule, CompositeRule, RuleNode};
use std::collections::HashSet;

pub trait RuleVisitor {
    type Output;

    fn visit_atomic(&mut self, rule: &AtomicRule) -> Self::Output;

    /// 组合节点的子节点遍历由实现自行决定（顺序、是否短路）
    fn visit_composite(&mut self, rule: &CompositeRule) -> Self::Output;
}

impl RuleNode {
    pub fn accept<V: RuleVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Self::Atomic(rule) => visitor.visit_atomic(rule),
            Self::Composite(rule) => visitor.visit_composite(rule),
        }
    }

    /// 规则树引用的全部属性键，按首次出现顺序去重
    pub fn required_properties(&self) -> Vec<String> {
        let mut collector = PropertyCollector::default();
        self.accept(&mut collector);
        collector.into_keys()
    }
}

/// 收集规则树中引用的属性键
#[derive(Debug, Default)]
pub struct PropertyCollector {
    keys: Vec<String>,
    seen: HashSet<String>,
}

impl PropertyCollector {
    pub fn into_keys(self) -> Vec<String> {
        self.keys
    }
}

impl RuleVisitor for PropertyCollector {
    type Output = ();

    fn visit_atomic(&mut self, rule: &AtomicRule) {
        if self.seen.insert(rule.property_key.clone()) {
            self.keys.push(rule.property_key.clone());
        }
    }

    fn visit_composite(&mut self, rule: &CompositeRule) {
        for child in &rule.children {
            child.accept(self);
        }
    }
}
