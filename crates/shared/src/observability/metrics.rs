//! 指标模块
//!
//! 基于 metrics crate 门面记录规则评估和谓词生成指标。
//! 宿主安装 recorder（如 Prometheus exporter）后才会真正导出，未安装时全部为空操作。

/// 注册指标描述
pub fn describe_metrics() {
    metrics::describe_counter!("rule_evaluations_total", "Total number of rule evaluations");
    metrics::describe_histogram!(
        "rule_evaluation_duration_seconds",
        "Rule evaluation duration in seconds"
    );
    metrics::describe_counter!(
        "predicate_fragments_total",
        "Total number of generated predicate fragments"
    );
    metrics::describe_counter!(
        "predicate_generations_total",
        "Total number of predicate generation runs"
    );
}

/// 记录规则评估
///
/// `outcome` 为 matched / not_matched 或错误类别
#[inline]
pub fn record_rule_evaluation(outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "rule_evaluations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);

    metrics::histogram!("rule_evaluation_duration_seconds").record(duration_secs);
}

/// 记录谓词生成
#[inline]
pub fn record_predicate_generation(fragment_count: usize) {
    metrics::counter!("predicate_generations_total").increment(1);
    metrics::counter!("predicate_fragments_total").increment(fragment_count as u64);
}
