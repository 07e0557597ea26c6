use crate::bootstrap::environment::Environment;
use crate::comm::config::ConfigSourceInfo;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

const MASK: &str = "******";
const SENSITIVE_KEYS: [&str; 4] = ["password", "secret", "token", "key"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvSnapshot {
    pub active_profiles: Vec<String>,
    pub property_sources: Vec<PropertySource>,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct PropertySource {
    pub name: String,
    pub loaded: bool,
    pub priority: u8,
}

impl From<&ConfigSourceInfo> for PropertySource {
    fn from(info: &ConfigSourceInfo) -> Self {
        Self {
            name: info.description.clone(),
            loaded: info.loaded,
            priority: info.priority,
        }
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|word| key.contains(word))
}

/// 展开所有配置项，敏感值打码
pub fn snapshot(env: &Environment) -> EnvSnapshot {
    let properties = env
        .config
        .flatten()
        .into_iter()
        .map(|(key, value)| {
            if is_sensitive(&key) {
                (key, Value::String(MASK.to_string()))
            } else {
                (key, value)
            }
        })
        .collect();

    EnvSnapshot {
        active_profiles: env.active_profiles.clone(),
        property_sources: env
            .config
            .get_sources_info()
            .iter()
            .map(PropertySource::from)
            .collect(),
        properties,
    }
}

/// 配置信息端点
#[utoipa::path(
    get,
    path = "/actuator/env",
    tag = "Actuator",
    responses((status = 200, description = "激活的 profile、配置源与配置项"))
)]
pub async fn env(environment: web::Data<Arc<Environment>>) -> HttpResponse {
    HttpResponse::Ok().json(snapshot(&environment))
}
