//! 规则引擎领域模型

use crate::operators::LogicalOperator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 规则节点（原子规则或组合规则）
///
/// 规则树自上而下拥有子节点，不共享子树，不允许出现环。
/// 评估器和访问者都只读遍历，不会修改规则树。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleNode {
    Atomic(AtomicRule),
    Composite(CompositeRule),
}

impl RuleNode {
    pub fn atomic(
        property_key: impl Into<String>,
        operator: impl Into<String>,
        expected: impl Into<Value>,
    ) -> Self {
        Self::Atomic(AtomicRule::new(property_key, operator, expected))
    }

    pub fn and(children: Vec<RuleNode>) -> Self {
        Self::Composite(CompositeRule::and(children))
    }

    pub fn or(children: Vec<RuleNode>) -> Self {
        Self::Composite(CompositeRule::or(children))
    }

    /// 从 JSON 字符串解析规则树
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// 规则树中原子规则的数量
    pub fn atomic_count(&self) -> usize {
        match self {
            Self::Atomic(_) => 1,
            Self::Composite(group) => group.children.iter().map(RuleNode::atomic_count).sum(),
        }
    }
}

impl From<AtomicRule> for RuleNode {
    fn from(rule: AtomicRule) -> Self {
        Self::Atomic(rule)
    }
}

impl From<CompositeRule> for RuleNode {
    fn from(rule: CompositeRule) -> Self {
        Self::Composite(rule)
    }
}

/// 原子规则：单个 属性/操作符/期望值 比较
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicRule {
    pub property_key: String,
    pub operator: String,
    pub expected: Value,
}

impl AtomicRule {
    pub fn new(
        property_key: impl Into<String>,
        operator: impl Into<String>,
        expected: impl Into<Value>,
    ) -> Self {
        Self {
            property_key: property_key.into(),
            operator: operator.into(),
            expected: expected.into(),
        }
    }
}

impl fmt::Display for AtomicRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.property_key, self.operator, self.expected)
    }
}

/// 组合规则：子规则的 AND/OR 组合
///
/// 空子节点集合是退化情况：AND 为 true，OR 为 false。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRule {
    pub operator: LogicalOperator,
    pub children: Vec<RuleNode>,
}

impl CompositeRule {
    pub fn new(operator: LogicalOperator, children: Vec<RuleNode>) -> Self {
        Self { operator, children }
    }

    pub fn and(children: Vec<RuleNode>) -> Self {
        Self::new(LogicalOperator::And, children)
    }

    pub fn or(children: Vec<RuleNode>) -> Self {
        Self::new(LogicalOperator::Or, children)
    }
}

/// 评估上下文：属性键到原始值的映射
///
/// 每次评估单独提供，引擎只读不持有。
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    data: Map<String, Value>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建；非对象的值得到空上下文
    pub fn from_value(data: Value) -> Self {
        match data {
            Value::Object(data) => Self { data },
            _ => Self::default(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Self { data })
    }

    /// 链式设置属性值
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// 按完整键精确查找属性值
    ///
    /// 评估器只使用这个方法：键中的 `.` 没有特殊含义。
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// 按点号路径逐级进入嵌套对象，数字段可以索引数组（如 "order.items.0.name"）
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.data.get(parts.next()?)?;

        for part in parts {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    current = arr.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for EvaluationContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let data = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { data }
    }
}

/// 带追踪的评估结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub matched: bool,
    /// 结果为 true 的原子规则，按评估顺序
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
    /// 实际执行过比较的原子规则数量（被短路跳过的不计）
    pub evaluated_conditions: usize,
    pub evaluation_time_ms: i64,
}
