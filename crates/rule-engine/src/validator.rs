//! 规则静态校验
//!
//! 不需要上下文，在评估前对照属性注册表检查整棵规则树：属性已注册、
//! 操作符被属性类型支持、期望值能被转换。遇到第一个问题即返回。

use crate::error::Result;
use crate::models::{AtomicRule, CompositeRule, RuleNode};
use crate::property::PropertyRegistry;
use crate::visitor::RuleVisitor;
use tracing::{instrument, warn};

pub struct RuleValidator<'a> {
    registry: &'a PropertyRegistry,
}

impl<'a> RuleValidator<'a> {
    pub fn new(registry: &'a PropertyRegistry) -> Self {
        Self { registry }
    }

    #[instrument(skip_all, fields(conditions = rule.atomic_count()))]
    pub fn validate(&self, rule: &RuleNode) -> Result<()> {
        let mut pass = ValidationPass {
            registry: self.registry,
            path: "root".to_string(),
        };
        rule.accept(&mut pass)
    }
}

struct ValidationPass<'a> {
    registry: &'a PropertyRegistry,
    path: String,
}

impl RuleVisitor for ValidationPass<'_> {
    type Output = Result<()>;

    fn visit_atomic(&mut self, rule: &AtomicRule) -> Result<()> {
        let definition = self.registry.get(&rule.property_key).inspect_err(|e| {
            warn!(path = %self.path, error = %e, "规则校验失败");
        })?;

        definition
            .convert_expected(&rule.operator, &rule.expected)
            .inspect_err(|e| {
                warn!(path = %self.path, error = %e, "规则校验失败");
            })?;
        Ok(())
    }

    fn visit_composite(&mut self, rule: &CompositeRule) -> Result<()> {
        if rule.children.is_empty() {
            warn!(path = %self.path, operator = %rule.operator, "组合规则没有子节点");
            return Ok(());
        }

        for (i, child) in rule.children.iter().enumerate() {
            let parent = self.path.clone();
            self.path = format!("{}.children[{}]", parent, i);
            let result = child.accept(self);
            self.path = parent;
            result?;
        }
        Ok(())
    }
}
