//! 类型化值
//!
//! 原始值（上下文和规则中的 `serde_json::Value`）在比较前都要经过属性类型转换，
//! 得到 [`TypedValue`]。每个值类型在内部使用具体的原生表示（`String`、`f64`），
//! 只有在注册表的类型擦除边界上才以 `TypedValue` 形式出现。

use serde_json::Value;
use std::fmt;

/// 转换后的值
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Number(f64),
}

impl TypedValue {
    /// 原生表示的名称
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => String::KIND,
            Self::Number(_) => f64::KIND,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// 值类型的原生表示
///
/// 新增一种原生表示需要同时扩展 [`TypedValue`]；在已有表示上新增值类型
/// （例如基于 `String` 的 "Email" 类型）只需要注册，不需要改代码。
pub trait NativeValue: Clone + fmt::Debug + Send + Sync + 'static {
    const KIND: &'static str;

    /// 把原始值规范化为原生表示，无法转换时返回 None
    fn from_raw(raw: &Value) -> Option<Self>;

    fn into_typed(self) -> TypedValue;

    fn from_typed(value: &TypedValue) -> Option<&Self>;
}

impl NativeValue for String {
    const KIND: &'static str = "text";

    fn from_raw(raw: &Value) -> Option<Self> {
        match raw {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            // null、数组、对象没有规范的字符串形式
            _ => None,
        }
    }

    fn into_typed(self) -> TypedValue {
        TypedValue::Text(self)
    }

    fn from_typed(value: &TypedValue) -> Option<&Self> {
        match value {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl NativeValue for f64 {
    const KIND: &'static str = "number";

    fn from_raw(raw: &Value) -> Option<Self> {
        match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn into_typed(self) -> TypedValue {
        TypedValue::Number(self)
    }

    fn from_typed(value: &TypedValue) -> Option<&Self> {
        match value {
            TypedValue::Number(n) => Some(n),
            _ => None,
        }
    }
}
