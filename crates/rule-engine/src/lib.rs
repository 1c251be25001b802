//! 规则引擎
//!
//! 把结构化的布尔条件（规则）对照运行时上下文求值，支持：
//! - 按值类型注册的可扩展比较操作符
//! - 属性到值类型的绑定，保证比较类型安全
//! - 短路求值和评估追踪
//! - 同一棵规则树的多种解释（评估、查询谓词生成），通过访问者扩展

pub mod error;
pub mod evaluator;
pub mod models;
pub mod operators;
pub mod predicate;
pub mod property;
pub mod validator;
pub mod value;
pub mod value_type;
pub mod visitor;

pub use error::{Result, RuleError};
pub use evaluator::RuleEvaluator;
pub use models::{AtomicRule, CompositeRule, EvaluationContext, EvaluationReport, RuleNode};
pub use operators::{FnOperator, LogicalOperator, Operator};
pub use predicate::{PredicateFragment, PredicateGenerator};
pub use property::{PropertyDefinition, PropertyRegistry, TypedProperty};
pub use validator::RuleValidator;
pub use value::{NativeValue, TypedValue};
pub use value_type::{TypeCatalog, ValueType, ValueTypeHandle, number_type, string_type};
pub use visitor::{PropertyCollector, RuleVisitor};
