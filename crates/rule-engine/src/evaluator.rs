//! 规则评估器
//!
//! 递归下降遍历规则树，通过属性注册表完成类型安全的比较。
//! AND 遇到 false、OR 遇到 true 立即返回，之后的子节点不会被评估，
//! 它们的查找或转换错误也不会暴露出来。任何错误都会中止整次评估。

use crate::error::{Result, RuleError};
use crate::models::{AtomicRule, CompositeRule, EvaluationContext, EvaluationReport, RuleNode};
use crate::operators::LogicalOperator;
use crate::property::PropertyRegistry;
use crate::visitor::RuleVisitor;
use rule_shared::observability::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// 规则评估器
///
/// 评估是 (规则树, 上下文) 的纯函数，同一个评估器可以在多个线程间共享。
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    registry: Arc<PropertyRegistry>,
}

impl RuleEvaluator {
    pub fn new(registry: Arc<PropertyRegistry>) -> Self {
        Self { registry }
    }

    /// 评估规则树
    pub fn evaluate(&self, rule: &RuleNode, context: &EvaluationContext) -> Result<bool> {
        let start = Instant::now();
        let mut pass = EvaluationPass::new(&self.registry, context, false);

        let result = rule.accept(&mut pass);
        Self::record(&result, pass.evaluated, start);
        result
    }

    /// 评估规则树并记录每一步比较和短路
    pub fn explain(
        &self,
        rule: &RuleNode,
        context: &EvaluationContext,
    ) -> Result<EvaluationReport> {
        let start = Instant::now();
        let mut pass = EvaluationPass::new(&self.registry, context, true);

        let result = rule.accept(&mut pass);
        Self::record(&result, pass.evaluated, start);

        let mut report = pass.report;
        report.matched = result?;
        report.evaluated_conditions = pass.evaluated;
        report.evaluation_time_ms = start.elapsed().as_millis() as i64;
        Ok(report)
    }

    /// 评估单个原子规则
    pub fn evaluate_atomic(&self, rule: &AtomicRule, context: &EvaluationContext) -> Result<bool> {
        compare(&self.registry, context, rule)
    }

    fn record(result: &Result<bool>, evaluated: usize, start: Instant) {
        let elapsed = start.elapsed();
        let outcome = match result {
            Ok(true) => "matched",
            Ok(false) => "not_matched",
            Err(e) => e.kind(),
        };

        debug!(
            outcome,
            evaluated_conditions = evaluated,
            elapsed_us = elapsed.as_micros() as u64,
            "规则评估完成"
        );
        metrics::record_rule_evaluation(outcome, elapsed.as_secs_f64());
    }
}

/// 原子规则比较
///
/// 顺序：查找属性定义 → 读取上下文值 → 按属性类型转换实际值 →
/// 解析操作符并按其规则转换期望值 → 比较。
fn compare(
    registry: &PropertyRegistry,
    context: &EvaluationContext,
    rule: &AtomicRule,
) -> Result<bool> {
    let definition = registry.get(&rule.property_key)?;

    let actual_raw = context
        .get(&rule.property_key)
        .ok_or_else(|| RuleError::MissingContextValue(rule.property_key.clone()))?;

    let actual = definition.convert(actual_raw)?;
    let expected = definition.convert_expected(&rule.operator, &rule.expected)?;
    let matched = definition.evaluate(&rule.operator, &actual, &expected)?;

    trace!(
        property = %rule.property_key,
        value_type = %definition.type_name(),
        operator = %rule.operator,
        %actual,
        %expected,
        matched,
        "原子规则比较"
    );

    Ok(matched)
}

/// 一次评估的遍历状态
struct EvaluationPass<'a> {
    registry: &'a PropertyRegistry,
    context: &'a EvaluationContext,
    trace_enabled: bool,
    path: Vec<String>,
    evaluated: usize,
    report: EvaluationReport,
}

impl<'a> EvaluationPass<'a> {
    fn new(
        registry: &'a PropertyRegistry,
        context: &'a EvaluationContext,
        trace_enabled: bool,
    ) -> Self {
        Self {
            registry,
            context,
            trace_enabled,
            path: vec!["root".to_string()],
            evaluated: 0,
            report: EvaluationReport::default(),
        }
    }

    fn path(&self) -> String {
        self.path.join(".")
    }

    fn push_trace(&mut self, line: String) {
        self.report.evaluation_trace.push(line);
    }

    fn visit_child(&mut self, index: usize, child: &RuleNode) -> Result<bool> {
        self.path.push(format!("children[{}]", index));
        let result = child.accept(self);
        self.path.pop();
        result
    }
}

impl RuleVisitor for EvaluationPass<'_> {
    type Output = Result<bool>;

    fn visit_atomic(&mut self, rule: &AtomicRule) -> Result<bool> {
        let matched = compare(self.registry, self.context, rule)?;
        self.evaluated += 1;

        if self.trace_enabled {
            let path = self.path();
            self.push_trace(format!(
                "{}: {} => {}",
                path,
                rule,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
            if matched {
                self.report
                    .matched_conditions
                    .push(format!("{}: {}", path, rule));
            }
        }

        Ok(matched)
    }

    fn visit_composite(&mut self, rule: &CompositeRule) -> Result<bool> {
        if rule.children.is_empty() {
            warn!(path = %self.path(), operator = %rule.operator, "组合规则没有子节点");
            let result = rule.operator.identity();
            if self.trace_enabled {
                let path = self.path();
                self.push_trace(format!("{}: 空 {} 组 => {}", path, rule.operator, result));
            }
            return Ok(result);
        }

        if self.trace_enabled {
            let path = self.path();
            self.push_trace(format!(
                "{}: 开始评估 {} 组 (共 {} 个子节点)",
                path,
                rule.operator,
                rule.children.len()
            ));
        }

        match rule.operator {
            LogicalOperator::And => {
                // AND: 遇到 false 立即返回
                for (i, child) in rule.children.iter().enumerate() {
                    if !self.visit_child(i, child)? {
                        if self.trace_enabled {
                            let path = self.path();
                            self.push_trace(format!("{}: AND 短路 - 子节点 {} 不匹配", path, i));
                        }
                        return Ok(false);
                    }
                }

                if self.trace_enabled {
                    let path = self.path();
                    self.push_trace(format!("{}: AND 组全部匹配", path));
                }
                Ok(true)
            }
            LogicalOperator::Or => {
                // OR: 遇到 true 立即返回
                for (i, child) in rule.children.iter().enumerate() {
                    if self.visit_child(i, child)? {
                        if self.trace_enabled {
                            let path = self.path();
                            self.push_trace(format!("{}: OR 短路 - 子节点 {} 匹配", path, i));
                        }
                        return Ok(true);
                    }
                }

                if self.trace_enabled {
                    let path = self.path();
                    self.push_trace(format!("{}: OR 组无匹配", path));
                }
                Ok(false)
            }
        }
    }
}
