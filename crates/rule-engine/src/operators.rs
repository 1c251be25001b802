//! 规则操作符定义
//!
//! 比较操作符按值类型插拔：每个 [`ValueType`](crate::value_type::ValueType) 持有自己的
//! 操作符集合，新增比较语义只需注册一个实现了 [`Operator`] 的处理器，
//! 评估器和规则模型都不需要改动。

use crate::value::NativeValue;
use parking_lot::RwLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// 内置操作符名称（大小写敏感）
pub mod names {
    pub const EQUALS: &str = "Equals";
    pub const CONTAINS: &str = "Contains";
    pub const STARTS_WITH: &str = "StartsWith";
    pub const ENDS_WITH: &str = "EndsWith";
    pub const MATCHES: &str = "Matches";
    pub const GREATER_THAN: &str = "GreaterThan";
    pub const LESS_THAN: &str = "LessThan";
}

/// 比较操作符
///
/// `convert` 把规则里的期望值规范化为该类型的原生表示；`evaluate` 是作用在
/// 两个已转换值上的纯函数，对类型正确的输入不会失败。
pub trait Operator<T: NativeValue>: Send + Sync {
    /// 操作符名称，在所属值类型内唯一
    fn name(&self) -> &str;

    fn convert(&self, raw: &Value) -> Option<T> {
        T::from_raw(raw)
    }

    fn evaluate(&self, actual: &T, expected: &T) -> bool;
}

type CompareFn<T> = dyn Fn(&T, &T) -> bool + Send + Sync;

/// 由闭包构造的操作符
///
/// ```ignore
/// let ends_with = FnOperator::new("EndsWith", |a: &String, e: &String| a.ends_with(e.as_str()));
/// string_type.register(Arc::new(ends_with));
/// ```
pub struct FnOperator<T> {
    name: String,
    compare: Box<CompareFn<T>>,
}

impl<T: NativeValue> FnOperator<T> {
    pub fn new(
        name: impl Into<String>,
        compare: impl Fn(&T, &T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            compare: Box::new(compare),
        }
    }
}

impl<T: NativeValue> Operator<T> for FnOperator<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&self, actual: &T, expected: &T) -> bool {
        (self.compare)(actual, expected)
    }
}

impl<T> fmt::Debug for FnOperator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperator").field("name", &self.name).finish()
    }
}

// ==================== String ====================

/// 精确字符串相等
#[derive(Debug, Default, Clone, Copy)]
pub struct TextEquals;

impl Operator<String> for TextEquals {
    fn name(&self) -> &str {
        names::EQUALS
    }

    fn evaluate(&self, actual: &String, expected: &String) -> bool {
        actual == expected
    }
}

/// 期望值是实际值的子串
#[derive(Debug, Default, Clone, Copy)]
pub struct Contains;

impl Operator<String> for Contains {
    fn name(&self) -> &str {
        names::CONTAINS
    }

    fn evaluate(&self, actual: &String, expected: &String) -> bool {
        actual.contains(expected.as_str())
    }
}

/// 实际值以期望值开头
#[derive(Debug, Default, Clone, Copy)]
pub struct StartsWith;

impl Operator<String> for StartsWith {
    fn name(&self) -> &str {
        names::STARTS_WITH
    }

    fn evaluate(&self, actual: &String, expected: &String) -> bool {
        actual.starts_with(expected.as_str())
    }
}

/// 实际值以期望值结尾（可选，不在默认集合中）
#[derive(Debug, Default, Clone, Copy)]
pub struct EndsWith;

impl Operator<String> for EndsWith {
    fn name(&self) -> &str {
        names::ENDS_WITH
    }

    fn evaluate(&self, actual: &String, expected: &String) -> bool {
        actual.ends_with(expected.as_str())
    }
}

/// 正则表达式匹配（可选，不在默认集合中）
///
/// 期望值在转换阶段编译并缓存，非法的正则按转换失败处理；比较时直接复用
/// 缓存的 [`Regex`]。缓存按模式文本索引，随规则中出现的不同模式增长。
#[derive(Debug, Default)]
pub struct Matches {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl Matches {
    pub fn new() -> Self {
        Self::default()
    }

    fn compile(&self, pattern: &str) -> Option<Regex> {
        if let Some(re) = self.compiled.read().get(pattern) {
            return Some(re.clone());
        }

        match Regex::new(pattern) {
            Ok(re) => {
                self.compiled.write().insert(pattern.to_string(), re.clone());
                Some(re)
            }
            Err(e) => {
                debug!(pattern, error = %e, "非法的正则表达式");
                None
            }
        }
    }
}

impl Operator<String> for Matches {
    fn name(&self) -> &str {
        names::MATCHES
    }

    fn convert(&self, raw: &Value) -> Option<String> {
        let pattern = String::from_raw(raw)?;
        self.compile(&pattern).map(|_| pattern)
    }

    fn evaluate(&self, actual: &String, expected: &String) -> bool {
        match self.compile(expected) {
            Some(re) => re.is_match(actual),
            // 只有绕过 convert 直接调用才会走到这里
            None => {
                warn!(pattern = %expected, "正则表达式未通过转换校验，按不匹配处理");
                false
            }
        }
    }
}

// ==================== Number ====================

/// 浮点数精确相等，不带容差
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberEquals;

impl Operator<f64> for NumberEquals {
    fn name(&self) -> &str {
        names::EQUALS
    }

    #[allow(clippy::float_cmp)]
    fn evaluate(&self, actual: &f64, expected: &f64) -> bool {
        actual == expected
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GreaterThan;

impl Operator<f64> for GreaterThan {
    fn name(&self) -> &str {
        names::GREATER_THAN
    }

    fn evaluate(&self, actual: &f64, expected: &f64) -> bool {
        actual > expected
    }
}

/// 可选，不在默认集合中
#[derive(Debug, Default, Clone, Copy)]
pub struct LessThan;

impl Operator<f64> for LessThan {
    fn name(&self) -> &str {
        names::LESS_THAN
    }

    fn evaluate(&self, actual: &f64, expected: &f64) -> bool {
        actual < expected
    }
}

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// 空子节点集合上的结果（AND 为 true，OR 为 false）
    pub fn identity(self) -> bool {
        match self {
            Self::And => true,
            Self::Or => false,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn test_text_equals_is_case_sensitive() {
        assert!(TextEquals.evaluate(&s("USA"), &s("USA")));
        assert!(!TextEquals.evaluate(&s("USA"), &s("usa")));
    }

    #[test]
    fn test_contains() {
        assert!(Contains.evaluate(&s("hello world"), &s("o w")));
        assert!(Contains.evaluate(&s("hello"), &s("")));
        assert!(!Contains.evaluate(&s("hello"), &s("World")));
        // 大小写敏感
        assert!(!Contains.evaluate(&s("USA"), &s("sa")));
        assert!(Contains.evaluate(&s("USA"), &s("SA")));
    }

    #[test]
    fn test_starts_with() {
        assert!(StartsWith.evaluate(&s("USA"), &s("U")));
        assert!(!StartsWith.evaluate(&s("USA"), &s("u")));
        assert!(!StartsWith.evaluate(&s("India"), &s("U")));
    }

    #[test]
    fn test_number_equals_has_no_tolerance() {
        assert!(NumberEquals.evaluate(&25.0, &25.0));
        assert!(!NumberEquals.evaluate(&(0.1 + 0.2), &0.3));
    }

    #[test]
    fn test_greater_than_is_strict() {
        assert!(GreaterThan.evaluate(&31.0, &30.0));
        assert!(!GreaterThan.evaluate(&30.0, &30.0));
        assert!(!GreaterThan.evaluate(&29.5, &30.0));
    }

    #[test]
    fn test_optional_operators() {
        assert!(EndsWith.evaluate(&s("report.pdf"), &s(".pdf")));
        assert!(LessThan.evaluate(&1.0, &2.0));
        assert!(!LessThan.evaluate(&2.0, &2.0));
    }

    #[test]
    fn test_matches_validates_pattern_on_convert() {
        let matches = Matches::new();
        assert_eq!(matches.convert(&json!("^U")), Some(s("^U")));
        assert_eq!(matches.convert(&json!("[invalid")), None);
        assert!(matches.evaluate(&s("USA"), &s("^U")));
        assert!(!matches.evaluate(&s("India"), &s("^U")));
    }

    #[test]
    fn test_matches_compiles_each_pattern_once() {
        let matches = Matches::new();
        let pattern = s(r"^[\w.-]+@[\w.-]+\.\w+$");

        assert_eq!(matches.convert(&json!(pattern)), Some(pattern.clone()));
        assert_eq!(matches.compiled.read().len(), 1);

        assert!(matches.evaluate(&s("user@example.com"), &pattern));
        assert!(!matches.evaluate(&s("not-an-email"), &pattern));
        assert_eq!(matches.compiled.read().len(), 1);
    }

    #[test]
    fn test_matches_rejects_invalid_pattern_at_evaluate() {
        let matches = Matches::new();
        assert!(!matches.evaluate(&s("[oops"), &s("[oops")));
        assert!(matches.compiled.read().is_empty());
    }

    #[test]
    fn test_default_convert_uses_native_conversion() {
        assert_eq!(<GreaterThan as Operator<f64>>::convert(&GreaterThan, &json!("30")), Some(30.0));
        assert_eq!(<GreaterThan as Operator<f64>>::convert(&GreaterThan, &json!("x")), None);
    }

    #[test]
    fn test_fn_operator() {
        let op = FnOperator::new("LengthEquals", |a: &String, e: &String| {
            a.len().to_string() == *e
        });
        assert_eq!(op.name(), "LengthEquals");
        assert!(op.evaluate(&s("abc"), &s("3")));
    }

    #[test]
    fn test_logical_operator_identity_and_serde() {
        assert!(LogicalOperator::And.identity());
        assert!(!LogicalOperator::Or.identity());
        assert_eq!(serde_json::to_string(&LogicalOperator::Or).unwrap(), "\"OR\"");
        assert_eq!(LogicalOperator::And.to_string(), "AND");
    }
}
