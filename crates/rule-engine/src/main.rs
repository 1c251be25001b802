//! 规则引擎命令行
//!
//! 用法：`rule-engine <rule.json> <context.json>`
//!
//! 读取规则树和上下文，校验后评估，并输出评估结果和对应的查询谓词片段。

use anyhow::{Context, Result, bail};
use rule_engine::{
    EvaluationContext, PredicateGenerator, PropertyRegistry, RuleEvaluator, RuleNode,
    RuleValidator, TypeCatalog,
};
use rule_shared::config::AppConfig;
use rule_shared::observability;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

const SERVICE_NAME: &str = "rule-engine";

/// 未配置 engine.properties 时使用的属性绑定
const DEFAULT_BINDINGS: [(&str, &str); 2] = [("country", "String"), ("age", "Number")];

fn main() -> Result<()> {
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let _guard = observability::init(&config.observability_config())?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (rule_path, context_path) = match args.as_slice() {
        [rule, context] => (rule, context),
        _ => bail!("usage: {} <rule.json> <context.json>", SERVICE_NAME),
    };

    let rule_json = fs::read_to_string(rule_path)
        .with_context(|| format!("无法读取规则文件 {}", rule_path))?;
    let rule = RuleNode::from_json(&rule_json).context("规则解析失败")?;

    let context_json = fs::read_to_string(context_path)
        .with_context(|| format!("无法读取上下文文件 {}", context_path))?;
    let context = EvaluationContext::from_json(&context_json).context("上下文解析失败")?;

    let registry = Arc::new(build_registry(&config)?);
    info!(
        properties = ?registry.keys(),
        required = ?rule.required_properties(),
        "规则已加载"
    );

    RuleValidator::new(&registry).validate(&rule)?;

    let evaluator = RuleEvaluator::new(registry);
    let evaluation = if config.engine.trace {
        serde_json::to_value(evaluator.explain(&rule, &context)?)?
    } else {
        json!({ "matched": evaluator.evaluate(&rule, &context)? })
    };

    let predicates = PredicateGenerator::new().generate(&rule);

    let output = json!({
        "evaluation": evaluation,
        "predicates": predicates,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// 按配置绑定属性
fn build_registry(config: &AppConfig) -> Result<PropertyRegistry> {
    let catalog = TypeCatalog::builtin();

    let registry = if config.engine.properties.is_empty() {
        warn!(bindings = ?DEFAULT_BINDINGS, "未配置属性绑定，使用默认绑定");
        PropertyRegistry::from_bindings(DEFAULT_BINDINGS, &catalog)?
    } else {
        PropertyRegistry::from_bindings(&config.engine.properties, &catalog)?
    };

    Ok(registry)
}
