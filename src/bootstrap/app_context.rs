use crate::actuator::{self, DownstreamHealthIndicator, HealthRegistry, InfoContributor, InfoState, PingHealthIndicator};
use crate::api::swagger_ui;
use crate::auth::InMemoryUserStore;
use crate::bootstrap::component_registry::{Component, ComponentRegistry};
use crate::bootstrap::environment::Environment;
use crate::bootstrap::route_registry::RouteRegistry;
use crate::comm::config::ConfigManager;
use crate::comm::config_validator::AppConfiguration;
use crate::controller;
use crate::error::{AppError, AppResult};
use crate::middleware::{CorsConfig, CorsMiddleware, SecurityConfig, SecurityMiddleware};
use actix_web::{http::header, web, HttpResponse};
use std::sync::Arc;
use tracing::info;

/// 应用上下文：启动时构建一次，之后只读共享
pub struct AppContext {
    pub context_path: String,
    pub environment: Arc<Environment>,
    pub routes: Arc<RouteRegistry>,
    pub components: Arc<ComponentRegistry>,
    pub health: Arc<HealthRegistry>,
    pub info: Arc<InfoState>,
    security: SecurityConfig,
    cors: CorsConfig,
}

impl AppContext {
    pub fn build(config: &AppConfiguration, config_manager: Arc<ConfigManager>) -> AppResult<Self> {
        let environment = Arc::new(Environment::new(
            config.app_name.clone(),
            config.active_profiles.clone(),
            config_manager,
        ));

        let mut routes = RouteRegistry::new();
        controller::register_routes(&mut routes);
        let routes = Arc::new(routes);

        let mut components = ComponentRegistry::new();
        components
            .register::<Environment>()
            .register::<SecurityConfig>()
            .register::<CorsConfig>()
            .register::<DownstreamHealthIndicator>()
            .register::<InfoContributor>();
        controller::register_components(&mut components);
        let components = Arc::new(components);

        let users = Arc::new(InMemoryUserStore::new(&config.users));
        let security = SecurityConfig::new(&config.server_context_path, users)
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
        let cors = CorsConfig::new(config.cors_allowed_origins.clone());
        cors.log_warning();

        let mut health = HealthRegistry::new();
        health
            .register("ping", Arc::new(PingHealthIndicator))
            .register(
                DownstreamHealthIndicator::NAME,
                Arc::new(DownstreamHealthIndicator::new(config.downstream.clone())?),
            );
        let health = Arc::new(health);

        let info = Arc::new(InfoState {
            contributor: InfoContributor::new(config.bean_packages_to_include.clone()),
            environment: environment.clone(),
            routes: routes.clone(),
            components: components.clone(),
        });

        info!(
            "应用上下文已构建: {} 个组件, {} 个路由",
            components.len(),
            routes.get_routes().len()
        );

        Ok(Self {
            context_path: config.server_context_path.clone(),
            environment,
            routes,
            components,
            health,
            info,
            security,
            cors,
        })
    }

    /// 挂载共享数据、文档、控制器与诊断端点
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let routes = self.routes.clone();

        cfg.app_data(web::Data::new(self.environment.clone()))
            .app_data(web::Data::new(self.health.clone()))
            .app_data(web::Data::new(self.info.clone()))
            .service(swagger_ui(&self.context_path));

        // `/ctx` 重定向到 `/ctx/`
        if !self.context_path.is_empty() {
            let location = format!("{}/", self.context_path);
            cfg.service(web::resource(self.context_path.as_str()).route(web::get().to(
                move || {
                    let location = location.clone();
                    async move {
                        HttpResponse::Found()
                            .insert_header((header::LOCATION, location))
                            .finish()
                    }
                },
            )));
        }

        cfg.service(
            web::scope(&self.context_path)
                .configure(move |scope| routes.configure_all_routes(scope))
                .configure(actuator::configure),
        );
    }

    pub fn security(&self) -> SecurityMiddleware {
        SecurityMiddleware::new(self.security.clone())
    }

    pub fn cors(&self) -> CorsMiddleware {
        CorsMiddleware::new(self.cors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::config::ConfigSource;
    use crate::comm::enhanced_config::EnhancedConfigManager;
    use actix_web::{test as actix_test, App};

    fn context(context_path: &str) -> AppContext {
        let mut manager = EnhancedConfigManager::from_sources(vec![ConfigSource::Memory(Default::default())], vec![]).unwrap();
        manager.get_app_config_mut().server_context_path = context_path.to_string();
        AppContext::build(manager.get_app_config(), manager.get_config_manager()).unwrap()
    }

    #[test]
    fn test_registries() {
        let context = context("");
        for name in [
            "environment",
            "securityConfig",
            "webConfig",
            "downstream-google",
            "customInfoContributor",
            "homeController",
            "statusController",
            "traverseController",
        ] {
            assert!(context.components.contains(name), "{}", name);
        }
        assert_eq!(context.routes.get_routes().len(), 3);
        assert_eq!(
            context.health.names().collect::<Vec<_>>(),
            vec!["ping", "downstream-google"]
        );
    }

    #[actix_web::test]
    async fn test_context_path_redirect() {
        let context = context("/koat");
        let app = actix_test::init_service(App::new().configure(|cfg| context.configure(cfg))).await;

        let req = actix_test::TestRequest::get().uri("/koat").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 302);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/koat/");

        let req = actix_test::TestRequest::get().uri("/koat/status").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let req = actix_test::TestRequest::get().uri("/status").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
