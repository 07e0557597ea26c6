use crate::comm::config::ConfigSource;
use crate::error::{AppError, AppResult};
use crate::middleware::cors::DEFAULT_ALLOWED_ORIGINS;
use config::FileFormat;
use serde::{Deserialize, Serialize};

/// 激活 profile 的环境变量（逗号分隔）
pub const PROFILES_ENV: &str = "TRAVERSE_PROFILES_ACTIVE";
/// 环境变量配置前缀，如 `TRAVERSE_SERVER__PORT`
pub const ENV_PREFIX: &str = "TRAVERSE";

/// 下游健康检查配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamConfig {
    pub url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://www.google.com".to_string(),
            timeout_ms: 5000,
            retries: 2,
            backoff_ms: 200,
        }
    }
}

/// 内存用户配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    pub roles: Vec<String>,
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfiguration {
    pub app_name: String,
    pub active_profiles: Vec<String>,
    pub server_host: String,
    pub server_port: u16,
    pub server_context_path: String,
    pub server_workers: Option<usize>,
    pub logging_level: String,
    pub logging_json_format: bool,
    pub downstream: DownstreamConfig,
    pub bean_packages_to_include: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
    pub users: Vec<UserConfig>,
}

impl Default for AppConfiguration {
    fn default() -> Self {
        Self {
            app_name: "traverse".to_string(),
            active_profiles: Vec::new(),
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            server_context_path: String::new(),
            server_workers: None,
            logging_level: "info".to_string(),
            logging_json_format: false,
            downstream: DownstreamConfig::default(),
            bean_packages_to_include: vec!["traverse".to_string()],
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            users: vec![
                UserConfig {
                    username: "user".to_string(),
                    password: "user".to_string(),
                    roles: vec!["USER".to_string()],
                },
                UserConfig {
                    username: "admin".to_string(),
                    password: "admin".to_string(),
                    roles: vec!["USER".to_string(), "ADMIN".to_string()],
                },
            ],
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// 配置验证器
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    /// 验证整个配置
    pub fn validate_config(&self, config: &AppConfiguration) -> AppResult<()> {
        if config.app_name.trim().is_empty() {
            return Err(AppError::validation("application.name", "应用名称不能为空"));
        }

        if config.server_host.is_empty() {
            return Err(AppError::validation("server.host", "服务器主机不能为空"));
        }

        if config.server_port == 0 {
            return Err(AppError::validation("server.port", "端口必须在1-65535范围内"));
        }

        let context_path = &config.server_context_path;
        if !context_path.is_empty() && (!context_path.starts_with('/') || context_path.ends_with('/')) {
            return Err(AppError::validation(
                "server.context_path",
                "上下文路径必须以 '/' 开头且不能以 '/' 结尾",
            ));
        }

        if let Some(workers) = config.server_workers {
            if workers == 0 || workers > 64 {
                return Err(AppError::validation("server.workers", "工作线程数必须在1-64范围内"));
            }
        }

        if !LOG_LEVELS.contains(&config.logging_level.as_str()) {
            return Err(AppError::validation(
                "logging.level",
                format!("值必须是以下之一: {}", LOG_LEVELS.join(", ")),
            ));
        }

        match reqwest::Url::parse(&config.downstream.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            _ => {
                return Err(AppError::validation(
                    "application.actuator.downstream.service.url",
                    format!("无效的下游地址: {}", config.downstream.url),
                ));
            }
        }

        if config.downstream.timeout_ms == 0 {
            return Err(AppError::validation(
                "application.actuator.downstream.timeout_ms",
                "超时时间必须大于0",
            ));
        }

        if let Some(user) = config.users.iter().find(|u| u.username.is_empty()) {
            return Err(AppError::validation(
                "security.users",
                format!("用户名不能为空 (角色: {:?})", user.roles),
            ));
        }

        Ok(())
    }
}

/// Profile 加载器：决定激活哪些 profile 以及对应的配置文件
#[derive(Debug, Clone)]
pub struct ProfileLoader {
    config_dir: String,
}

impl Default for ProfileLoader {
    fn default() -> Self {
        Self::new("config")
    }
}

impl ProfileLoader {
    pub fn new(config_dir: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// 从环境变量读取激活的 profile；未设置时返回 None
    pub fn profiles_from_env() -> Option<Vec<String>> {
        std::env::var(PROFILES_ENV).ok().map(|raw| parse_profiles(&raw))
    }

    /// 基础配置源：application.toml + 环境变量
    pub fn base_sources(&self) -> Vec<ConfigSource> {
        vec![self.file_source("application"), env_source()]
    }

    /// 完整配置源，按优先级从低到高排列
    pub fn sources_for(&self, profiles: &[String]) -> Vec<ConfigSource> {
        let mut sources = vec![self.file_source("application")];
        for profile in profiles {
            sources.push(self.file_source(&format!("application-{}", profile)));
        }
        sources.push(env_source());
        sources
    }

    fn file_source(&self, name: &str) -> ConfigSource {
        ConfigSource::File {
            path: format!("{}/{}.toml", self.config_dir, name),
            format: Some(FileFormat::Toml),
            required: false,
        }
    }
}

fn env_source() -> ConfigSource {
    ConfigSource::Env {
        prefix: ENV_PREFIX.to_string(),
        separator: "__",
    }
}

/// 解析逗号分隔的 profile 列表，忽略空白项
pub fn parse_profiles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
