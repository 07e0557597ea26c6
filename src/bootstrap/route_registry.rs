use crate::bootstrap::component_registry::Component;
use actix_web::{http::Method, web, FromRequest, Handler, Responder};
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// 路由配置函数类型
pub type RouteConfigFn = Arc<dyn Fn(&mut web::ServiceConfig) + Send + Sync>;

/// HTTP 方法（声明顺序即排序顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl RequestMethod {
    pub fn as_method(&self) -> Method {
        match self {
            RequestMethod::Get => Method::GET,
            RequestMethod::Head => Method::HEAD,
            RequestMethod::Post => Method::POST,
            RequestMethod::Put => Method::PUT,
            RequestMethod::Patch => Method::PATCH,
            RequestMethod::Delete => Method::DELETE,
            RequestMethod::Options => Method::OPTIONS,
            RequestMethod::Trace => Method::TRACE,
        }
    }
}

/// 路由表条目，按 (method, path) 排序
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    pub method: RequestMethod,
    pub path: String,
    pub handler: String,
}

impl Ord for RouteEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.method
            .cmp(&other.method)
            .then_with(|| self.path.cmp(&other.path))
            .then_with(|| self.handler.cmp(&other.handler))
    }
}

impl PartialOrd for RouteEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 路由信息结构
#[derive(Clone)]
pub struct RouteInfo {
    /// 所属控制器的组件名称
    pub controller: String,
    pub entry: RouteEntry,
    config_fn: RouteConfigFn,
}

impl std::fmt::Debug for RouteInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteInfo")
            .field("controller", &self.controller)
            .field("entry", &self.entry)
            .finish()
    }
}

/// 路由注册器
///
/// 路由表与实际挂载到 actix 的路由同源，`/actuator/info` 读取的就是真实路由。
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: Vec<RouteInfo>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为控制器 `C` 注册路由
    pub fn controller<C: Component>(&mut self) -> ControllerRoutes<'_> {
        ControllerRoutes {
            registry: self,
            controller: C::NAME,
        }
    }

    /// 注册一条路由
    pub fn register_route<F, Args>(
        &mut self,
        controller: &str,
        method: RequestMethod,
        path: &str,
        handler: F,
    ) -> &mut Self
    where
        F: Handler<Args> + Send + Sync,
        Args: FromRequest + 'static,
        F::Output: Responder + 'static,
    {
        let entry = RouteEntry {
            method,
            path: path.to_string(),
            handler: describe_handler::<F, Args>(),
        };
        let route_path = path.to_string();
        let config_fn: RouteConfigFn = Arc::new(move |cfg: &mut web::ServiceConfig| {
            cfg.route(
                &route_path,
                web::method(method.as_method()).to(handler.clone()),
            );
        });
        self.routes.push(RouteInfo {
            controller: controller.to_string(),
            entry,
            config_fn,
        });
        self
    }

    /// 获取所有路由（注册顺序）
    pub fn get_routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// 获取指定控制器的路由，按 (method, path) 排序
    pub fn get_routes_by_controller(&self, controller: &str) -> Vec<&RouteEntry> {
        let mut entries: Vec<&RouteEntry> = self
            .routes
            .iter()
            .filter(|route| route.controller == controller)
            .map(|route| &route.entry)
            .collect();
        entries.sort();
        entries
    }

    /// 配置所有路由到 ServiceConfig
    pub fn configure_all_routes(&self, cfg: &mut web::ServiceConfig) {
        for route_info in &self.routes {
            (route_info.config_fn)(cfg);
        }
    }

    /// 打印路由信息
    pub fn print_routes_info(&self) {
        let mut routes: Vec<&RouteInfo> = self.routes.iter().collect();
        routes.sort_by(|a, b| a.entry.cmp(&b.entry));
        for route in routes {
            tracing::info!(
                "路由: {:?} {} -> {} ({})",
                route.entry.method,
                route.entry.path,
                route.entry.handler,
                route.controller
            );
        }
        tracing::info!("总计: {} 个路由", self.routes.len());
    }
}

/// 单个控制器的路由注册器
pub struct ControllerRoutes<'a> {
    registry: &'a mut RouteRegistry,
    controller: &'static str,
}

impl ControllerRoutes<'_> {
    pub fn route<F, Args>(&mut self, method: RequestMethod, path: &str, handler: F) -> &mut Self
    where
        F: Handler<Args> + Send + Sync,
        Args: FromRequest + 'static,
        F::Output: Responder + 'static,
    {
        self.registry
            .register_route(self.controller, method, path, handler);
        self
    }

    pub fn get<F, Args>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Handler<Args> + Send + Sync,
        Args: FromRequest + 'static,
        F::Output: Responder + 'static,
    {
        self.route(RequestMethod::Get, path, handler)
    }
}

/// 处理函数签名描述，如 `traverse::controller::traverse::traverse()`
fn describe_handler<F, Args>() -> String {
    format!(
        "{}{}",
        std::any::type_name::<F>(),
        std::any::type_name::<Args>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, App, HttpResponse};

    struct SampleController;

    impl Component for SampleController {
        const NAME: &'static str = "sampleController";
        const RESOURCE: &'static str = file!();
    }

    async fn list() -> HttpResponse {
        HttpResponse::Ok().body("list")
    }

    async fn create() -> HttpResponse {
        HttpResponse::Created().body("create")
    }

    fn sample_registry() -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        registry
            .controller::<SampleController>()
            .route(RequestMethod::Post, "/items", create)
            .get("/items/b", list)
            .get("/items/a", list)
            .route(RequestMethod::Delete, "/items", create);
        registry
    }

    #[test]
    fn test_method_order() {
        assert!(RequestMethod::Get < RequestMethod::Head);
        assert!(RequestMethod::Head < RequestMethod::Post);
        assert!(RequestMethod::Patch < RequestMethod::Delete);
        assert!(RequestMethod::Options < RequestMethod::Trace);
    }

    #[test]
    fn test_routes_sorted_by_method_then_path() {
        let registry = sample_registry();
        let keys: Vec<(RequestMethod, &str)> = registry
            .get_routes_by_controller("sampleController")
            .iter()
            .map(|entry| (entry.method, entry.path.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (RequestMethod::Get, "/items/a"),
                (RequestMethod::Get, "/items/b"),
                (RequestMethod::Post, "/items"),
                (RequestMethod::Delete, "/items"),
            ]
        );
    }

    #[test]
    fn test_route_listing_is_deterministic() {
        let registry = sample_registry();
        let first = registry.get_routes_by_controller("sampleController");
        let second = registry.get_routes_by_controller("sampleController");
        assert_eq!(first, second);
        assert!(registry.get_routes_by_controller("unknown").is_empty());
    }

    #[test]
    fn test_handler_description() {
        let registry = sample_registry();
        let entry = &registry.get_routes()[0].entry;
        assert!(entry.handler.ends_with("tests::create()"), "{}", entry.handler);
    }

    #[actix_web::test]
    async fn test_registered_routes_are_served() {
        let registry = Arc::new(sample_registry());
        let routes = registry.clone();
        let app = actix_test::init_service(
            App::new().configure(move |cfg| routes.configure_all_routes(cfg)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/items/a").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = actix_test::TestRequest::post().uri("/items").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let req = actix_test::TestRequest::put().uri("/items").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
