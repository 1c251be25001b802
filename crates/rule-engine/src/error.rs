//! 规则引擎错误类型
//!
//! 所有错误都会立即中止当前的评估或生成调用，原样返回给直接调用方，
//! 不会被吞掉或默认成 true/false。

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("属性未注册: {0}")]
    PropertyNotRegistered(String),

    #[error("上下文缺少属性值: {0}")]
    MissingContextValue(String),

    #[error("值转换失败: 属性 {key} 的值 {raw} 无法转换为 {target_type}")]
    ConversionError {
        key: String,
        raw: Value,
        target_type: String,
    },

    #[error("操作符未找到: {operator} 不被类型 {type_name} 支持")]
    OperatorNotFound { operator: String, type_name: String },

    #[error("无效的规则: {0}")]
    InvalidRule(String),

    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RuleError {
    /// 稳定的错误类别标签，用于日志字段和指标标签
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PropertyNotRegistered(_) => "property_not_registered",
            Self::MissingContextValue(_) => "missing_context_value",
            Self::ConversionError { .. } => "conversion_error",
            Self::OperatorNotFound { .. } => "operator_not_found",
            Self::InvalidRule(_) => "invalid_rule",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::JsonError(_) => "json_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
