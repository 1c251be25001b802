//! 属性注册表
//!
//! 把属性键（如 "age"）绑定到唯一的值类型。注册表通过 [`PropertyDefinition`]
//! 统一持有不同原生表示的属性，类型检查只发生在各自的 [`TypedProperty`] 内部。

use crate::error::{Result, RuleError};
use crate::value::{NativeValue, TypedValue};
use crate::value_type::{TypeCatalog, ValueType};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 类型擦除后的属性定义
pub trait PropertyDefinition: Send + Sync {
    fn key(&self) -> &str;

    /// 所属值类型的名称
    fn type_name(&self) -> &str;

    fn supported_operators(&self) -> Vec<String>;

    fn supports(&self, operator: &str) -> bool;

    /// 按属性类型转换原始值（上下文中的实际值）
    fn convert(&self, raw: &Value) -> Result<TypedValue>;

    /// 按指定操作符的转换规则转换期望值
    fn convert_expected(&self, operator: &str, raw: &Value) -> Result<TypedValue>;

    /// 以指定操作符比较两个已转换的值
    fn evaluate(&self, operator: &str, actual: &TypedValue, expected: &TypedValue)
    -> Result<bool>;
}

impl fmt::Debug for dyn PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("key", &self.key())
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// 绑定到具体值类型的属性
pub struct TypedProperty<T: NativeValue> {
    key: String,
    value_type: Arc<ValueType<T>>,
}

impl<T: NativeValue> TypedProperty<T> {
    pub fn new(key: impl Into<String>, value_type: Arc<ValueType<T>>) -> Self {
        Self {
            key: key.into(),
            value_type,
        }
    }

    fn conversion_error(&self, raw: &Value) -> RuleError {
        RuleError::ConversionError {
            key: self.key.clone(),
            raw: raw.clone(),
            target_type: self.value_type.name().to_string(),
        }
    }

    fn unwrap_typed<'a>(&self, value: &'a TypedValue) -> Result<&'a T> {
        T::from_typed(value).ok_or_else(|| RuleError::TypeMismatch {
            expected: format!("{} ({})", self.value_type.name(), T::KIND),
            actual: value.kind().to_string(),
        })
    }
}

impl<T: NativeValue> PropertyDefinition for TypedProperty<T> {
    fn key(&self) -> &str {
        &self.key
    }

    fn type_name(&self) -> &str {
        self.value_type.name()
    }

    fn supported_operators(&self) -> Vec<String> {
        self.value_type.supported_operators()
    }

    fn supports(&self, operator: &str) -> bool {
        self.value_type.supports(operator)
    }

    fn convert(&self, raw: &Value) -> Result<TypedValue> {
        self.value_type
            .convert(raw)
            .map(NativeValue::into_typed)
            .ok_or_else(|| self.conversion_error(raw))
    }

    fn convert_expected(&self, operator: &str, raw: &Value) -> Result<TypedValue> {
        let op = self.value_type.get_operator(operator)?;
        op.convert(raw)
            .map(NativeValue::into_typed)
            .ok_or_else(|| self.conversion_error(raw))
    }

    fn evaluate(
        &self,
        operator: &str,
        actual: &TypedValue,
        expected: &TypedValue,
    ) -> Result<bool> {
        let op = self.value_type.get_operator(operator)?;
        let actual = self.unwrap_typed(actual)?;
        let expected = self.unwrap_typed(expected)?;
        Ok(op.evaluate(actual, expected))
    }
}

/// 属性注册表
///
/// 在评估开始前由宿主填充，评估期间只读。跨线程共享时包一层 `Arc`，
/// 注册必须在共享之前完成。
#[derive(Default, Clone)]
pub struct PropertyRegistry {
    properties: HashMap<String, Arc<dyn PropertyDefinition>>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定属性到值类型
    ///
    /// 已存在的同名绑定会被整体替换。
    pub fn register<T: NativeValue>(
        &mut self,
        key: impl Into<String>,
        value_type: Arc<ValueType<T>>,
    ) -> &mut Self {
        self.register_definition(Arc::new(TypedProperty::new(key, value_type)))
    }

    /// 注册任意实现了 [`PropertyDefinition`] 的定义
    pub fn register_definition(&mut self, definition: Arc<dyn PropertyDefinition>) -> &mut Self {
        let key = definition.key().to_string();
        debug!(property = %key, value_type = %definition.type_name(), "注册属性");

        if let Some(previous) = self.properties.insert(key.clone(), definition) {
            debug!(property = %key, previous_type = %previous.type_name(), "属性绑定已替换");
        }
        self
    }

    /// 按值类型名称绑定属性
    pub fn register_named(
        &mut self,
        key: &str,
        type_name: &str,
        catalog: &TypeCatalog,
    ) -> Result<&mut Self> {
        let handle = catalog.get(type_name).ok_or_else(|| {
            RuleError::InvalidRule(format!("属性 '{}' 引用了未知的值类型 '{}'", key, type_name))
        })?;
        Ok(self.register_definition(handle.bind(key)))
    }

    /// 从 (属性键, 值类型名称) 列表批量构建
    pub fn from_bindings<K, V>(
        bindings: impl IntoIterator<Item = (K, V)>,
        catalog: &TypeCatalog,
    ) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut registry = Self::new();
        for (key, type_name) in bindings {
            registry.register_named(key.as_ref(), type_name.as_ref(), catalog)?;
        }

        info!(property_count = registry.len(), "属性注册表构建完成");
        Ok(registry)
    }

    pub fn get(&self, key: &str) -> Result<&dyn PropertyDefinition> {
        self.properties
            .get(key)
            .map(|definition| definition.as_ref())
            .ok_or_else(|| RuleError::PropertyNotRegistered(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.properties.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings: Vec<(String, String)> = self
            .keys()
            .into_iter()
            .filter_map(|key| {
                let type_name = self.properties.get(&key)?.type_name().to_string();
                Some((key, type_name))
            })
            .collect();
        f.debug_struct("PropertyRegistry")
            .field("bindings", &bindings)
            .finish()
    }
}
