use crate::bootstrap::component_registry::Component;
use actix_web::{
    body::BoxBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{
        header::{self, HeaderMap, HeaderValue},
        Method,
    },
    Error, HttpResponse,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use tracing::{debug, warn};

/// 默认允许的本地开发来源
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

/// 跨域配置
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub exposed_headers: Vec<String>,
    /// 预检结果缓存时间（秒）
    pub max_age: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect())
    }
}

impl CorsConfig {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self {
            allowed_origins,
            exposed_headers: vec![
                "Content-Type".to_string(),
                "Content-Disposition".to_string(),
                "Pragma".to_string(),
            ],
            max_age: 1800,
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(origin))
    }

    /// 启动时的开发环境提示
    pub fn log_warning(&self) {
        warn!(
            "CORS has been enabled for local development with origins {:?}. THIS CORS CONFIGURATION SHOULD NOT GO TO QA OR PROD ENVIRONMENT",
            self.allowed_origins
        );
    }
}

impl Component for CorsConfig {
    const NAME: &'static str = "webConfig";
    const RESOURCE: &'static str = file!();

    fn aliases() -> &'static [&'static str] {
        &["corsConfigurer"]
    }

    fn configured_fields() -> &'static [(&'static str, &'static str)] {
        &[("allowed_origins", "${cors.allowed_origins}")]
    }
}

/// CORS 中间件
pub struct CorsMiddleware {
    config: Rc<CorsConfig>,
}

impl CorsMiddleware {
    pub fn new(config: CorsConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }
}

impl<S> Transform<S, ServiceRequest> for CorsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = CorsMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsMiddlewareService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct CorsMiddlewareService<S> {
    service: Rc<S>,
    config: Rc<CorsConfig>,
}

/// 同源请求不做 CORS 处理
fn is_same_origin(req: &ServiceRequest, origin: &str) -> bool {
    let info = req.connection_info();
    let own = format!("{}://{}", info.scheme(), info.host());
    own.eq_ignore_ascii_case(origin)
}

fn is_preflight(req: &ServiceRequest) -> bool {
    req.method() == Method::OPTIONS
        && req
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

fn rejected(req: ServiceRequest) -> ServiceResponse<BoxBody> {
    req.into_response(HttpResponse::Forbidden().body("Invalid CORS request"))
}

fn insert_vary_origin(headers: &mut HeaderMap) {
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
}

fn preflight_response(req: &ServiceRequest, config: &CorsConfig, origin: &HeaderValue) -> HttpResponse {
    let mut builder = HttpResponse::Ok();
    builder.insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone()));
    // 所有方法与请求头均放行，原样回显
    if let Some(method) = req.headers().get(header::ACCESS_CONTROL_REQUEST_METHOD) {
        builder.insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, method.clone()));
    }
    if let Some(headers) = req.headers().get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
        builder.insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, headers.clone()));
    }
    builder.insert_header((header::ACCESS_CONTROL_MAX_AGE, config.max_age.to_string()));

    let mut response = builder.finish();
    let headers = response.headers_mut();
    insert_vary_origin(headers);
    headers.append(
        header::VARY,
        HeaderValue::from_static("Access-Control-Request-Method"),
    );
    headers.append(
        header::VARY,
        HeaderValue::from_static("Access-Control-Request-Headers"),
    );
    response
}

impl<S> Service<ServiceRequest> for CorsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let Some(origin) = req.headers().get(header::ORIGIN).cloned() else {
                return service.call(req).await;
            };
            let origin_str = origin.to_str().unwrap_or_default().to_string();

            if is_same_origin(&req, &origin_str) {
                return service.call(req).await;
            }

            if !config.is_allowed(&origin_str) {
                warn!("拒绝跨域请求: {} {} (Origin: {})", req.method(), req.path(), origin_str);
                return Ok(rejected(req));
            }

            if is_preflight(&req) {
                debug!("CORS 预检: {} (Origin: {})", req.path(), origin_str);
                let response = preflight_response(&req, &config, &origin);
                return Ok(req.into_response(response));
            }

            let mut res = service.call(req).await?;
            let headers = res.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            if let Ok(exposed) = HeaderValue::from_str(&config.exposed_headers.join(", ")) {
                headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, exposed);
            }
            insert_vary_origin(headers);
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test as actix_test, web, App, HttpResponse};

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().body("ok")
    }

    #[test]
    fn test_default_origins() {
        let config = CorsConfig::default();
        assert!(config.is_allowed("http://localhost:3000"));
        assert!(config.is_allowed("http://127.0.0.1:5173"));
        assert!(!config.is_allowed("http://evil.example.com"));
        assert_eq!(config.max_age, 1800);
    }

    #[actix_web::test]
    async fn test_preflight_allowed_and_rejected() {
        let app = actix_test::init_service(
            App::new()
                .wrap(CorsMiddleware::new(CorsConfig::default()))
                .route("/api/v1/traverse", web::get().to(ok)),
        )
        .await;

        let req = actix_test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/api/v1/traverse")
            .insert_header((header::ORIGIN, "http://localhost:5173"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_HEADERS).unwrap(),
            "authorization"
        );
        assert_eq!(resp.headers().get(header::ACCESS_CONTROL_MAX_AGE).unwrap(), "1800");

        let req = actix_test::TestRequest::default()
            .method(Method::OPTIONS)
            .uri("/api/v1/traverse")
            .insert_header((header::ORIGIN, "http://evil.example.com"))
            .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
        let body = actix_test::read_body(resp).await;
        assert_eq!(body, "Invalid CORS request");
    }

    #[actix_web::test]
    async fn test_simple_requests() {
        let app = actix_test::init_service(
            App::new()
                .wrap(CorsMiddleware::new(CorsConfig::default()))
                .route("/status", web::get().to(ok)),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/status")
            .insert_header((header::ORIGIN, "http://localhost:3000"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_EXPOSE_HEADERS).unwrap(),
            "Content-Type, Content-Disposition, Pragma"
        );
        assert_eq!(resp.headers().get(header::VARY).unwrap(), "Origin");

        // 无 Origin
        let req = actix_test::TestRequest::get().uri("/status").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        // 不允许的来源
        let req = actix_test::TestRequest::get()
            .uri("/status")
            .insert_header((header::ORIGIN, "http://evil.example.com"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403);
    }
}
