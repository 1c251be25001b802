//! 规则评估性能基准测试
//!
//! 覆盖单个原子规则、宽 AND 组（最坏情况无短路）和嵌套组合规则，
//! 以及对应的谓词生成。

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rule_engine::{
    EvaluationContext, PredicateGenerator, PropertyRegistry, RuleEvaluator, RuleNode,
    number_type, string_type,
};
use std::hint::black_box;
use std::sync::Arc;

fn create_evaluator(fields: usize) -> RuleEvaluator {
    let strings = string_type();
    let numbers = number_type();

    let mut registry = PropertyRegistry::new();
    registry.register("country", strings.clone());
    registry.register("age", numbers.clone());
    for i in 0..fields {
        registry.register(format!("field_{}", i), numbers.clone());
    }
    RuleEvaluator::new(Arc::new(registry))
}

fn create_context(fields: usize) -> EvaluationContext {
    let mut ctx = EvaluationContext::new().with("country", "USA").with("age", 31);
    for i in 0..fields {
        ctx.insert(format!("field_{}", i), i as f64);
    }
    ctx
}

/// 所有条件都成立的 AND 组，必须全部评估
fn create_and_rule(conditions: usize) -> RuleNode {
    RuleNode::and(
        (0..conditions)
            .map(|i| RuleNode::atomic(format!("field_{}", i), "Equals", i as f64))
            .collect(),
    )
}

/// 交替 AND/OR 的嵌套规则
fn create_nested_rule(depth: usize, breadth: usize) -> RuleNode {
    fn build(depth: usize, breadth: usize, index: usize) -> RuleNode {
        if depth == 0 {
            return RuleNode::atomic(format!("field_{}", index), "GreaterThan", -1.0);
        }
        let children = (0..breadth).map(|i| build(depth - 1, breadth, i)).collect();
        if depth % 2 == 0 {
            RuleNode::and(children)
        } else {
            RuleNode::or(children)
        }
    }
    build(depth, breadth, 0)
}

fn bench_atomic(c: &mut Criterion) {
    let evaluator = create_evaluator(0);
    let ctx = create_context(0);
    let string_rule = RuleNode::atomic("country", "StartsWith", "U");
    let number_rule = RuleNode::atomic("age", "GreaterThan", 30);

    let mut group = c.benchmark_group("atomic");
    group.bench_function("string_starts_with", |b| {
        b.iter(|| evaluator.evaluate(black_box(&string_rule), black_box(&ctx)))
    });
    group.bench_function("number_greater_than", |b| {
        b.iter(|| evaluator.evaluate(black_box(&number_rule), black_box(&ctx)))
    });
    group.finish();
}

fn bench_and_width(c: &mut Criterion) {
    let mut group = c.benchmark_group("and_width");
    for width in [5usize, 20, 100] {
        let evaluator = create_evaluator(width);
        let ctx = create_context(width);
        let rule = create_and_rule(width);

        group.bench_with_input(BenchmarkId::from_parameter(width), &rule, |b, rule| {
            b.iter(|| evaluator.evaluate(black_box(rule), black_box(&ctx)))
        });
    }
    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let evaluator = create_evaluator(4);
    let ctx = create_context(4);

    let mut group = c.benchmark_group("nested");
    for depth in [2usize, 4, 6] {
        let rule = create_nested_rule(depth, 3);
        group.bench_with_input(BenchmarkId::new("evaluate", depth), &rule, |b, rule| {
            b.iter(|| evaluator.evaluate(black_box(rule), black_box(&ctx)))
        });
        group.bench_with_input(BenchmarkId::new("explain", depth), &rule, |b, rule| {
            b.iter(|| evaluator.explain(black_box(rule), black_box(&ctx)))
        });
        group.bench_with_input(BenchmarkId::new("predicates", depth), &rule, |b, rule| {
            b.iter(|| PredicateGenerator::new().generate(black_box(rule)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_atomic, bench_and_width, bench_nested);
criterion_main!(benches);
