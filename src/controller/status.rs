use crate::bootstrap::component_registry::Component;
use crate::bootstrap::environment::Environment;
use actix_web::{web, HttpResponse};
use std::sync::Arc;
use tracing::info;

/// 状态控制器
pub struct StatusController;

impl Component for StatusController {
    const NAME: &'static str = "statusController";
    const RESOURCE: &'static str = file!();

    fn dependencies() -> &'static [&'static str] {
        &["environment"]
    }

    fn configured_fields() -> &'static [(&'static str, &'static str)] {
        &[("app_name", "${application.name}")]
    }
}

/// 状态描述，如 `traverse is up and running with profiles(s): [dev]`
pub fn status_message(env: &Environment) -> String {
    format!(
        "{} is up and running with profiles(s): {}",
        env.app_name,
        env.profiles_display()
    )
}

/// 应用名与激活的 profile
#[utoipa::path(
    get,
    path = "/status",
    tag = "Status",
    responses((status = 200, description = "应用状态", body = String))
)]
pub async fn status(env: web::Data<Arc<Environment>>) -> HttpResponse {
    let message = status_message(&env);
    info!("{}", message);
    HttpResponse::Ok().body(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::config::ConfigManager;
    use actix_web::{test as actix_test, App};

    fn environment(profiles: &[&str]) -> Arc<Environment> {
        Arc::new(Environment::new(
            "koat",
            profiles.iter().map(|p| p.to_string()).collect(),
            Arc::new(ConfigManager::with_sources(vec![]).unwrap()),
        ))
    }

    #[test]
    fn test_status_message() {
        assert_eq!(
            status_message(&environment(&[])),
            "koat is up and running with profiles(s): []"
        );
        assert_eq!(
            status_message(&environment(&["dev", "local"])),
            "koat is up and running with profiles(s): [dev, local]"
        );
    }

    #[actix_web::test]
    async fn test_status_endpoint() {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(environment(&["dev"])))
                .route("/status", web::get().to(status)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/status").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        assert_eq!(body, "koat is up and running with profiles(s): [dev]");
    }
}
