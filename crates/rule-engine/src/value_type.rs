//! 值类型与操作符注册表
//!
//! [`ValueType`] 是一个具名的比较域（如 "String"、"Number"），持有该类型支持的
//! 操作符，按名称路由。操作符以 `Arc<dyn Operator<T>>` 保存，同一个值类型可以
//! 被多个属性共享；绑定属性之后继续注册的操作符对这些属性同样可见。
//!
//! 注册应在单线程的初始化阶段完成。读写锁只保证内存安全，
//! 不保证注册与并发评估之间的先后顺序。
//!
//! ## 使用示例
//!
//! ```ignore
//! use rule_engine::operators::FnOperator;
//! use rule_engine::value_type::{string_type, TypeCatalog};
//! use std::sync::Arc;
//!
//! let strings = string_type();
//! strings.register(Arc::new(FnOperator::new("EndsWith", |a: &String, e: &String| {
//!     a.ends_with(e.as_str())
//! })));
//!
//! let mut catalog = TypeCatalog::builtin();
//! catalog.register(strings);
//! ```

use crate::error::{Result, RuleError};
use crate::operators::{Contains, GreaterThan, NumberEquals, Operator, StartsWith, TextEquals};
use crate::property::{PropertyDefinition, TypedProperty};
use crate::value::NativeValue;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 内置值类型名称
pub const STRING_TYPE: &str = "String";
pub const NUMBER_TYPE: &str = "Number";

/// 值类型
pub struct ValueType<T: NativeValue> {
    name: String,
    operators: RwLock<HashMap<String, Arc<dyn Operator<T>>>>,
}

impl<T: NativeValue> ValueType<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operators: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册操作符
    ///
    /// 同名操作符会被替换，后注册的生效。操作符只增不删。
    pub fn register(&self, operator: Arc<dyn Operator<T>>) -> &Self {
        let name = operator.name().to_string();
        debug!(value_type = %self.name, operator = %name, "注册操作符");
        self.operators.write().insert(name, operator);
        self
    }

    /// 构造期链式注册
    pub fn with_operator(self, operator: impl Operator<T> + 'static) -> Self {
        self.register(Arc::new(operator));
        self
    }

    /// 已注册的操作符名称，顺序无意义
    pub fn supported_operators(&self) -> Vec<String> {
        self.operators.read().keys().cloned().collect()
    }

    pub fn supports(&self, operator: &str) -> bool {
        self.operators.read().contains_key(operator)
    }

    pub fn get_operator(&self, operator: &str) -> Result<Arc<dyn Operator<T>>> {
        self.operators
            .read()
            .get(operator)
            .cloned()
            .ok_or_else(|| RuleError::OperatorNotFound {
                operator: operator.to_string(),
                type_name: self.name.clone(),
            })
    }

    /// 把原始值转换为该类型的原生表示
    pub fn convert(&self, raw: &Value) -> Option<T> {
        T::from_raw(raw)
    }
}

impl<T: NativeValue> fmt::Debug for ValueType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operators = self.supported_operators();
        operators.sort();
        f.debug_struct("ValueType")
            .field("name", &self.name)
            .field("native", &T::KIND)
            .field("operators", &operators)
            .finish()
    }
}

/// 内置 String 类型：Equals / Contains / StartsWith
pub fn string_type() -> Arc<ValueType<String>> {
    Arc::new(
        ValueType::new(STRING_TYPE)
            .with_operator(TextEquals)
            .with_operator(Contains)
            .with_operator(StartsWith),
    )
}

/// 内置 Number 类型：Equals / GreaterThan
pub fn number_type() -> Arc<ValueType<f64>> {
    Arc::new(
        ValueType::new(NUMBER_TYPE)
            .with_operator(NumberEquals)
            .with_operator(GreaterThan),
    )
}

/// 类型擦除后的值类型句柄
///
/// 让不同原生表示的值类型可以放进同一个目录，并按名称绑定到属性上。
pub trait ValueTypeHandle: Send + Sync {
    fn name(&self) -> &str;

    fn supported_operators(&self) -> Vec<String>;

    /// 以该类型创建属性定义
    fn bind(self: Arc<Self>, key: &str) -> Arc<dyn PropertyDefinition>;
}

impl<T: NativeValue> ValueTypeHandle for ValueType<T> {
    fn name(&self) -> &str {
        ValueType::name(self)
    }

    fn supported_operators(&self) -> Vec<String> {
        ValueType::supported_operators(self)
    }

    fn bind(self: Arc<Self>, key: &str) -> Arc<dyn PropertyDefinition> {
        Arc::new(TypedProperty::new(key, self))
    }
}

/// 值类型目录，按类型名称索引
#[derive(Clone)]
pub struct TypeCatalog {
    types: HashMap<String, Arc<dyn ValueTypeHandle>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// 包含内置 String 和 Number 类型的目录
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(string_type());
        catalog.register(number_type());

        info!(types = ?catalog.names(), "内置值类型初始化完成");
        catalog
    }

    /// 注册值类型，同名替换
    pub fn register<T: NativeValue>(&mut self, value_type: Arc<ValueType<T>>) -> &mut Self {
        debug!(value_type = %value_type.name(), native = T::KIND, "注册值类型");
        self.types
            .insert(value_type.name().to_string(), value_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ValueTypeHandle>> {
        self.types.get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::{EndsWith, FnOperator};
    use serde_json::json;
    use std::collections::HashSet;

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn test_builtin_operator_sets() {
        assert_eq!(
            sorted(string_type().supported_operators()),
            vec!["Contains", "Equals", "StartsWith"]
        );
        assert_eq!(
            sorted(number_type().supported_operators()),
            vec!["Equals", "GreaterThan"]
        );
    }

    #[test]
    fn test_get_operator_not_found_names_operator_and_type() {
        let numbers = number_type();
        let err = numbers.get_operator("Contains").err().unwrap();
        match err {
            RuleError::OperatorNotFound {
                operator,
                type_name,
            } => {
                assert_eq!(operator, "Contains");
                assert_eq!(type_name, "Number");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_operator_names_are_case_sensitive() {
        assert!(string_type().get_operator("startswith").is_err());
        assert!(string_type().get_operator("StartsWith").is_ok());
    }

    #[test]
    fn test_register_replaces_by_name() {
        let strings = string_type();
        // 把 Equals 替换为忽略大小写的版本
        strings.register(Arc::new(FnOperator::new(
            "Equals",
            |a: &String, e: &String| a.eq_ignore_ascii_case(e),
        )));

        let op = strings.get_operator("Equals").unwrap();
        assert!(op.evaluate(&"USA".to_string(), &"usa".to_string()));
        assert_eq!(strings.supported_operators().len(), 3);
    }

    #[test]
    fn test_register_new_operator_extends_type() {
        let strings = string_type();
        strings.register(Arc::new(EndsWith));

        let ops: HashSet<String> = strings.supported_operators().into_iter().collect();
        assert!(ops.contains("EndsWith"));
        assert_eq!(ops.len(), 4);
    }

    #[test]
    fn test_convert() {
        assert_eq!(number_type().convert(&json!("12.5")), Some(12.5));
        assert_eq!(number_type().convert(&json!("twelve")), None);
        assert_eq!(string_type().convert(&json!(7)), Some("7".to_string()));
    }

    #[test]
    fn test_catalog() {
        let mut catalog = TypeCatalog::builtin();
        assert_eq!(catalog.names(), vec!["Number", "String"]);
        assert!(catalog.get("Boolean").is_none());

        let email = Arc::new(ValueType::<String>::new("Email").with_operator(EndsWith));
        catalog.register(email);
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.get("Email").unwrap().supported_operators(),
            vec!["EndsWith"]
        );
    }
}
