//! 集成测试公共工具 / Shared helpers for integration tests

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use config::FileFormat;
use std::net::TcpListener;
use traverse::comm::config::ConfigSource;
use traverse::comm::enhanced_config::EnhancedConfigManager;
use traverse::AppContext;

/// 一个没有监听者的本地端口，用于模拟不可达的下游服务
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// 基础测试配置，`extra` 追加在末尾
pub fn config_toml(context_path: &str, extra: &str) -> String {
    format!(
        r#"
[application]
name = "koat"

[application.actuator.downstream]
timeout_ms = 500
retries = 0
backoff_ms = 10

[application.actuator.downstream.service]
url = "http://127.0.0.1:{port}/"

[server]
context_path = "{context_path}"
{extra}
"#,
        port = closed_port(),
        context_path = context_path,
        extra = extra,
    )
}

pub fn context_from(toml: &str, profiles: &[&str]) -> AppContext {
    let manager = EnhancedConfigManager::from_sources(
        vec![ConfigSource::String {
            content: toml.to_string(),
            format: FileFormat::Toml,
        }],
        profiles.iter().map(|p| p.to_string()).collect(),
    )
    .unwrap();
    AppContext::build(manager.get_app_config(), manager.get_config_manager()).unwrap()
}

pub fn context(context_path: &str) -> AppContext {
    context_from(&config_toml(context_path, ""), &["dev"])
}

pub fn basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)))
}

/// 与生产一致的中间件顺序初始化测试服务
macro_rules! init_app {
    ($context:expr) => {{
        let context = &$context;
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(context.security())
                .wrap(context.cors())
                .configure(|cfg| context.configure(cfg)),
        )
        .await
    }};
}
