use anyhow::{anyhow, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },
    #[error("配置项 '{key}' 不存在")]
    KeyNotFound { key: String },
    #[error("配置项 '{key}' 类型转换失败: {message}")]
    TypeConversionError { key: String, message: String },
    #[error("配置初始化失败: {message}")]
    InitializationError { message: String },
}

/// 配置数据源信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConfigSourceInfo {
    pub source_type: String,
    pub description: String,
    pub priority: u8,
    pub loaded: bool,
}

/// 配置管理器
///
/// 配置源按添加顺序生效，后添加者覆盖先添加者。
#[derive(Debug)]
pub struct ConfigManager {
    config: Config,
    sources_info: Vec<ConfigSourceInfo>,
}

impl ConfigManager {
    /// 使用指定的配置源创建配置管理器
    pub fn with_sources(sources: Vec<ConfigSource>) -> Result<Self> {
        let mut builder = Config::builder();
        let mut sources_info = Vec::new();

        for (index, source) in sources.into_iter().enumerate() {
            let priority = (index + 1) as u8;
            let source_info = source.get_source_info(priority);

            // 可选文件不存在时仅记录，必需文件不存在时直接报错
            if let ConfigSource::File { path, required, .. } = &source {
                if !std::path::Path::new(path).exists() {
                    if *required {
                        return Err(ConfigError::FileNotFound { path: path.clone() }.into());
                    }
                    sources_info.push(source_info);
                    continue;
                }
            }

            builder = source
                .add_to_builder(builder)
                .map_err(|e| anyhow!("添加配置源失败: {}", e))?;
            sources_info.push(ConfigSourceInfo {
                loaded: true,
                ..source_info
            });
        }

        let config = builder
            .build()
            .map_err(|e| anyhow!("构建配置失败: {}", e))?;
        Ok(Self {
            config,
            sources_info,
        })
    }

    /// 获取指定 key 的配置值
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.config
            .get(key)
            .map_err(|e| anyhow!("获取配置 '{}' 失败: {}", key, e))
    }

    /// 安全获取配置值，区分"不存在"与"类型错误"
    pub fn get_safe<T: DeserializeOwned>(&self, key: &str) -> std::result::Result<T, ConfigError> {
        self.config.get(key).map_err(|e| match e {
            config::ConfigError::NotFound(_) => ConfigError::KeyNotFound {
                key: key.to_string(),
            },
            other => ConfigError::TypeConversionError {
                key: key.to_string(),
                message: other.to_string(),
            },
        })
    }

    /// 获取可选配置值：不存在返回 None，类型错误返回 Err
    pub fn get_optional<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> std::result::Result<Option<T>, ConfigError> {
        match self.get_safe(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::KeyNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 获取字符串配置值
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get(key)
    }

    /// 检查配置项是否存在
    pub fn exists(&self, key: &str) -> bool {
        self.config.get::<serde_json::Value>(key).is_ok()
    }

    /// 获取所有配置的克隆（用于调试）
    pub fn get_all(&self) -> HashMap<String, serde_json::Value> {
        self.config
            .clone()
            .try_deserialize::<HashMap<String, serde_json::Value>>()
            .unwrap_or_default()
    }

    /// 以 `a.b.c` 形式展开所有配置项
    pub fn flatten(&self) -> BTreeMap<String, serde_json::Value> {
        let mut flat = BTreeMap::new();
        for (key, value) in self.get_all() {
            flatten_into(&key, value, &mut flat);
        }
        flat
    }

    /// 获取所有配置源信息
    pub fn get_sources_info(&self) -> &[ConfigSourceInfo] {
        &self.sources_info
    }

    /// 获取配置源统计信息 (总计, 成功, 失败)
    pub fn get_sources_stats(&self) -> (usize, usize, usize) {
        let total = self.sources_info.len();
        let loaded = self.sources_info.iter().filter(|info| info.loaded).count();
        (total, loaded, total - loaded)
    }

    /// 打印配置源详细信息
    pub fn print_sources_info(&self) {
        for (index, info) in self.sources_info.iter().enumerate() {
            let status = if info.loaded { "✓ 已加载" } else { "✗ 未加载" };
            info!(
                "配置源 {}. {} - {} (优先级: {}) {}",
                index + 1,
                info.source_type,
                status,
                info.priority,
                info.description
            );
        }

        let (total, loaded, failed) = self.get_sources_stats();
        info!(
            "统计: 总计 {} 个配置源，成功 {} 个，未加载 {} 个",
            total, loaded, failed
        );
    }
}

fn flatten_into(
    prefix: &str,
    value: serde_json::Value,
    flat: &mut BTreeMap<String, serde_json::Value>,
) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{}.{}", prefix, key), nested, flat);
            }
        }
        // 仅展开包含表的数组，如 `security.users[0].username`
        serde_json::Value::Array(items) if items.iter().any(|item| item.is_object()) => {
            for (index, item) in items.into_iter().enumerate() {
                flatten_into(&format!("{}[{}]", prefix, index), item, flat);
            }
        }
        other => {
            flat.insert(prefix.to_string(), other);
        }
    }
}

/// 配置源类型
pub enum ConfigSource {
    /// 文件配置源
    File {
        path: String,
        format: Option<FileFormat>,
        required: bool,
    },
    /// 环境变量配置源
    Env {
        prefix: String,
        separator: &'static str,
    },
    /// 内存配置源（HashMap）
    Memory(HashMap<String, serde_json::Value>),
    /// 字符串配置源
    String { content: String, format: FileFormat },
}

impl ConfigSource {
    /// 获取配置源信息
    pub fn get_source_info(&self, priority: u8) -> ConfigSourceInfo {
        let (source_type, description) = match self {
            ConfigSource::File {
                path,
                format,
                required,
            } => (
                "File",
                format!(
                    "文件配置源: {} (格式: {}, 必需: {})",
                    path,
                    format.map(format_name).unwrap_or("Auto-detect"),
                    required
                ),
            ),
            ConfigSource::Env { prefix, separator } => (
                "Environment",
                format!("环境变量配置源: 前缀={}, 分隔符={}", prefix, separator),
            ),
            ConfigSource::Memory(map) => ("Memory", format!("内存配置源: {} 个配置项", map.len())),
            ConfigSource::String { format, .. } => (
                "String",
                format!("字符串配置源: 格式={}", format_name(*format)),
            ),
        };
        ConfigSourceInfo {
            source_type: source_type.to_string(),
            description,
            priority,
            loaded: false,
        }
    }

    pub fn add_to_builder(
        self,
        builder: ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<ConfigBuilder<config::builder::DefaultState>> {
        match self {
            ConfigSource::File {
                path,
                format,
                required,
            } => {
                let file_source = match format {
                    Some(format) => File::with_name(&path).format(format),
                    None => File::with_name(&path),
                };
                Ok(builder.add_source(file_source.required(required)))
            }
            ConfigSource::Env { prefix, separator } => Ok(builder.add_source(
                Environment::with_prefix(&prefix)
                    .separator(separator)
                    .prefix_separator("_")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .with_list_parse_key("application.actuator.bean.packages.to.include")
                    .try_parsing(true)
                    .ignore_empty(true),
            )),
            ConfigSource::Memory(map) => {
                let json_content = serde_json::to_string(&map)
                    .map_err(|e| anyhow!("序列化内存配置失败: {}", e))?;
                Ok(builder.add_source(File::from_str(&json_content, FileFormat::Json)))
            }
            ConfigSource::String { content, format } => {
                Ok(builder.add_source(File::from_str(&content, format)))
            }
        }
    }
}

fn format_name(format: FileFormat) -> &'static str {
    match format {
        FileFormat::Toml => "TOML",
        FileFormat::Yaml => "YAML",
        FileFormat::Json => "JSON",
        FileFormat::Ini => "INI",
        FileFormat::Ron => "RON",
        FileFormat::Json5 => "JSON5",
        _ => "Unknown",
    }
}
