use crate::comm::config::{ConfigManager, ConfigSource};
use crate::comm::config_validator::{parse_profiles, AppConfiguration, ConfigValidator, ProfileLoader};
use crate::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// 增强的配置管理器：原始配置 + 经过验证的类型化配置
pub struct EnhancedConfigManager {
    config_manager: Arc<ConfigManager>,
    app_config: AppConfiguration,
}

impl EnhancedConfigManager {
    /// 按 profile 加载 `config/` 目录下的配置
    pub fn new() -> AppResult<Self> {
        Self::with_loader(&ProfileLoader::default())
    }

    /// 使用指定的 profile 加载器创建
    pub fn with_loader(loader: &ProfileLoader) -> AppResult<Self> {
        // 环境变量优先；否则读取基础配置中的 profiles.active
        let profiles = match ProfileLoader::profiles_from_env() {
            Some(profiles) => profiles,
            None => active_profiles(&build_manager(loader.base_sources())?)?,
        };

        Self::from_sources(loader.sources_for(&profiles), profiles)
    }

    /// 使用给定配置源创建（测试中常用）
    pub fn from_sources(sources: Vec<ConfigSource>, profiles: Vec<String>) -> AppResult<Self> {
        let config_manager = Arc::new(build_manager(sources)?);
        let app_config = Self::load_app_config(&config_manager, profiles)?;

        Ok(Self {
            config_manager,
            app_config,
        })
    }

    /// 加载应用配置
    fn load_app_config(
        config_manager: &ConfigManager,
        active_profiles: Vec<String>,
    ) -> AppResult<AppConfiguration> {
        let mut app_config = AppConfiguration {
            active_profiles,
            ..AppConfiguration::default()
        };

        if let Some(name) = optional(config_manager, "application.name")? {
            app_config.app_name = name;
        }
        if let Some(host) = optional(config_manager, "server.host")? {
            app_config.server_host = host;
        }
        if let Some(port) = optional(config_manager, "server.port")? {
            app_config.server_port = port;
        }
        if let Some(context_path) = optional(config_manager, "server.context_path")? {
            app_config.server_context_path = context_path;
        }
        if let Some(workers) = optional(config_manager, "server.workers")? {
            app_config.server_workers = Some(workers);
        }
        if let Some(level) = optional(config_manager, "logging.level")? {
            app_config.logging_level = level;
        }
        if let Some(json_format) = optional(config_manager, "logging.json_format")? {
            app_config.logging_json_format = json_format;
        }
        if let Some(url) = optional(config_manager, "application.actuator.downstream.service.url")? {
            app_config.downstream.url = url;
        }
        if let Some(timeout) = optional(config_manager, "application.actuator.downstream.timeout_ms")? {
            app_config.downstream.timeout_ms = timeout;
        }
        if let Some(retries) = optional(config_manager, "application.actuator.downstream.retries")? {
            app_config.downstream.retries = retries;
        }
        if let Some(backoff) = optional(config_manager, "application.actuator.downstream.backoff_ms")? {
            app_config.downstream.backoff_ms = backoff;
        }
        if let Some(packages) =
            optional(config_manager, "application.actuator.bean.packages.to.include")?
        {
            app_config.bean_packages_to_include = packages;
        }
        if let Some(origins) = optional(config_manager, "cors.allowed_origins")? {
            app_config.cors_allowed_origins = origins;
        }
        if let Some(users) = optional(config_manager, "security.users")? {
            app_config.users = users;
        }

        ConfigValidator::new().validate_config(&app_config)?;

        Ok(app_config)
    }

    /// 获取应用配置
    pub fn get_app_config(&self) -> &AppConfiguration {
        &self.app_config
    }

    /// 获取可修改的应用配置（命令行覆盖）
    pub fn get_app_config_mut(&mut self) -> &mut AppConfiguration {
        &mut self.app_config
    }

    /// 获取原始配置管理器
    pub fn get_config_manager(&self) -> Arc<ConfigManager> {
        Arc::clone(&self.config_manager)
    }

    /// 打印配置摘要；需在日志初始化之后调用
    pub fn print_config_summary(&self) {
        info!("配置加载和验证成功");
        info!("激活的 profiles: {:?}", self.app_config.active_profiles);
        debug!("应用配置: {:?}", self.app_config);
        info!("=== 配置摘要 ===");
        info!("应用: {}", self.app_config.app_name);
        info!(
            "服务器: {}:{}{}",
            self.app_config.server_host,
            self.app_config.server_port,
            self.app_config.server_context_path
        );
        info!("工作线程: {:?}", self.app_config.server_workers);
        info!("日志级别: {}", self.app_config.logging_level);
        info!("JSON日志: {}", self.app_config.logging_json_format);
        info!("下游健康检查: {}", self.app_config.downstream.url);

        self.config_manager.print_sources_info();
    }
}

fn build_manager(sources: Vec<ConfigSource>) -> AppResult<ConfigManager> {
    ConfigManager::with_sources(sources).map_err(|e| {
        AppError::Config(crate::comm::config::ConfigError::InitializationError {
            message: e.to_string(),
        })
    })
}

/// `profiles.active` 可以是列表，也可以是逗号分隔的字符串
fn active_profiles(manager: &ConfigManager) -> AppResult<Vec<String>> {
    match optional::<Value>(manager, "profiles.active")? {
        None => Ok(Vec::new()),
        Some(Value::String(raw)) => Ok(parse_profiles(&raw)),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(profile) => Ok(profile),
                other => Err(AppError::validation(
                    "profiles.active",
                    format!("profile 必须是字符串: {}", other),
                )),
            })
            .collect(),
        Some(other) => Err(AppError::validation(
            "profiles.active",
            format!("应为字符串或字符串列表: {}", other),
        )),
    }
}

fn optional<T: DeserializeOwned>(manager: &ConfigManager, key: &str) -> AppResult<Option<T>> {
    Ok(manager.get_optional(key)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn toml(content: &str) -> ConfigSource {
        ConfigSource::String {
            content: content.to_string(),
            format: FileFormat::Toml,
        }
    }

    #[test]
    fn test_defaults_when_no_keys() {
        let manager = EnhancedConfigManager::from_sources(vec![], Vec::new()).unwrap();
        let config = manager.get_app_config();
        assert_eq!(config.app_name, "traverse");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.users.len(), 2);
    }

    #[test]
    fn test_keys_are_mapped() {
        let manager = EnhancedConfigManager::from_sources(
            vec![toml(
                r#"
                [application]
                name = "koat"

                [application.actuator.downstream.service]
                url = "http://localhost:9999/ping"

                [application.actuator.bean.packages.to]
                include = ["traverse::actuator"]

                [server]
                port = 9090
                context_path = "/koat"
                "#,
            )],
            vec!["dev".to_string()],
        )
        .unwrap();
        let config = manager.get_app_config();
        assert_eq!(config.app_name, "koat");
        assert_eq!(config.server_port, 9090);
        assert_eq!(config.server_context_path, "/koat");
        assert_eq!(config.downstream.url, "http://localhost:9999/ping");
        assert_eq!(config.bean_packages_to_include, vec!["traverse::actuator"]);
        assert_eq!(config.active_profiles, vec!["dev"]);
    }

    fn loader_with(application_toml: &str) -> (std::path::PathBuf, ProfileLoader) {
        let dir = std::env::temp_dir().join(format!(
            "traverse-profiles-{}-{}",
            std::process::id(),
            application_toml.len()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("application.toml"), application_toml).unwrap();
        std::fs::write(dir.join("application-dev.toml"), "[server]\nport = 9191\n").unwrap();
        let loader = ProfileLoader::new(dir.to_string_lossy().to_string());
        (dir, loader)
    }

    #[test]
    fn test_active_profiles_forms() {
        let manager = build_manager(vec![toml("[profiles]\nactive = \"dev, local\"")]).unwrap();
        assert_eq!(active_profiles(&manager).unwrap(), vec!["dev", "local"]);

        let manager = build_manager(vec![toml("[profiles]\nactive = [\"dev\"]")]).unwrap();
        assert_eq!(active_profiles(&manager).unwrap(), vec!["dev"]);

        let manager = build_manager(vec![]).unwrap();
        assert!(active_profiles(&manager).unwrap().is_empty());

        let manager = build_manager(vec![toml("[profiles]\nactive = 3")]).unwrap();
        assert!(matches!(active_profiles(&manager), Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_string_profile_is_loaded() {
        if ProfileLoader::profiles_from_env().is_some() {
            return;
        }
        let (dir, loader) = loader_with("[profiles]\nactive = \"dev\"\n");
        let manager = EnhancedConfigManager::with_loader(&loader).unwrap();
        assert_eq!(manager.get_app_config().active_profiles, vec!["dev"]);
        assert_eq!(manager.get_app_config().server_port, 9191);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_summary_reports_loading() {
        let manager =
            EnhancedConfigManager::from_sources(vec![], vec!["dev".to_string()]).unwrap();
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || manager.print_config_summary());

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("配置加载和验证成功"));
        assert!(output.contains("激活的 profiles: [\"dev\"]"));
    }

    #[test]
    fn test_type_errors_are_reported() {
        let result = EnhancedConfigManager::from_sources(
            vec![toml("[server]\nport = \"not-a-port\"")],
            Vec::new(),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validation_errors_are_reported() {
        let result = EnhancedConfigManager::from_sources(
            vec![toml("[logging]\nlevel = \"loud\"")],
            Vec::new(),
        );
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}
