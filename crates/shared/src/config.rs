//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use crate::observability::ObservabilityConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// 环境变量前缀（RULES__ENGINE__TRACE -> engine.trace）
pub const ENV_PREFIX: &str = "RULES";

/// 规则引擎配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 属性键 -> 值类型名称（如 age = "Number"）
    pub properties: HashMap<String, String>,
    /// 是否输出评估追踪
    pub trace: bool,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "rule-engine".to_string(),
            environment: "development".to_string(),
            observability: ObservabilityConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULES__ 前缀，如 RULES__OBSERVABILITY__LOG_LEVEL -> observability.log_level）
    ///
    /// 环境由 RULES_ENV 指定，配置目录由 CONFIG_DIR 指定。
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RULES_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), &env, service_name)
    }

    /// 从指定目录加载
    pub fn load_from(config_dir: &Path, env: &str, service_name: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 入口使用的可观测性配置
    ///
    /// 填入服务名；生产环境强制输出 JSON 日志。
    pub fn observability_config(&self) -> ObservabilityConfig {
        let mut config = self
            .observability
            .clone()
            .with_service_name(&self.service_name);
        if self.is_production() {
            config.json_logs = true;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rule-shared-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.service_name, "rule-engine");
        assert_eq!(config.observability.log_level, "info");
        assert!(config.engine.properties.is_empty());
        assert!(!config.is_production());
    }

    #[test]
    fn test_production_forces_json_logs() {
        let mut config = AppConfig::default();
        let obs = config.observability_config();
        assert_eq!(obs.service_name, "rule-engine");
        assert!(!obs.json_logs);

        config.environment = "production".to_string();
        let obs = config.observability_config();
        assert!(obs.json_logs);
        assert_eq!(obs.log_level, config.observability.log_level);
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = scratch_dir("empty");
        let config = AppConfig::load_from(&dir, "test", "rule-engine").unwrap();

        assert_eq!(config.service_name, "rule-engine");
        assert_eq!(config.environment, "test");
        assert!(!config.engine.trace);
    }

    #[test]
    fn test_files_are_layered() {
        let dir = scratch_dir("layered");
        fs::write(
            dir.join("default.toml"),
            r#"
            [observability]
            log_level = "debug"

            [engine.properties]
            country = "String"
            age = "Number"
            "#,
        )
        .unwrap();
        fs::write(
            dir.join("production.toml"),
            r#"
            [observability]
            log_level = "warn"
            json_logs = true
            "#,
        )
        .unwrap();

        let config = AppConfig::load_from(&dir, "production", "rule-engine").unwrap();
        assert!(config.is_production());
        assert_eq!(config.observability.log_level, "warn");
        assert!(config.observability.json_logs);
        assert_eq!(config.engine.properties.get("age").map(String::as_str), Some("Number"));
        assert_eq!(config.engine.properties.len(), 2);
    }
}
