//! 运维诊断端点
//! Operational diagnostics endpoints

pub mod env;
pub mod health;
pub mod info;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::{json, Map, Value};

pub use health::{DownstreamHealthIndicator, Health, HealthIndicator, HealthRegistry, PingHealthIndicator, Status};
pub use info::{InfoContributor, InfoState};

const ENDPOINTS: [&str; 3] = ["health", "info", "env"];

/// 端点索引
#[utoipa::path(
    get,
    path = "/actuator",
    tag = "Actuator",
    responses((status = 200, description = "端点链接"))
)]
pub async fn links(req: HttpRequest) -> HttpResponse {
    let base = {
        let info = req.connection_info();
        format!("{}://{}{}", info.scheme(), info.host(), req.path().trim_end_matches('/'))
    };

    let mut links = Map::new();
    links.insert("self".to_string(), json!({ "href": base }));
    for endpoint in ENDPOINTS {
        links.insert(endpoint.to_string(), json!({ "href": format!("{}/{}", base, endpoint) }));
    }
    HttpResponse::Ok().json(json!({ "_links": Value::Object(links) }))
}

/// 挂载 `/actuator` 下的所有端点；依赖的数据由调用方通过 `app_data` 提供
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/actuator")
            .route("", web::get().to(links))
            .route("/health", web::get().to(health::health))
            .route("/info", web::get().to(info::info))
            .route("/env", web::get().to(env::env)),
    );
}
