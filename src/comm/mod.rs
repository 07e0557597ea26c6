/// 通用模块：配置、日志与工具函数
/// Common module: configuration, logging and helpers

pub mod config;
pub mod config_validator;
pub mod enhanced_config;
pub mod strings;
pub mod tracing;

// 重新导出主要的公共接口
pub use strings::starts_with_any;
