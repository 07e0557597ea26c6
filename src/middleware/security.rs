use crate::auth::{InMemoryUserStore, Principal};
use crate::bootstrap::component_registry::Component;
use crate::error::AppError;
use actix_web::{
    body::BoxBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderValue},
    Error, HttpMessage, ResponseError,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use regex::Regex;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// 路径访问要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// 无需认证
    PermitAll,
    /// 需要任一角色
    AnyRole(Vec<String>),
    /// 只需认证
    Authenticated,
}

/// Ant 风格路径模式：`*` 匹配单段，`**` 匹配任意剩余部分
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    regex: Regex,
}

impl PathPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut expr = String::from("^");
        let mut rest = pattern;
        while !rest.is_empty() {
            if let Some(tail) = rest.strip_prefix("/**") {
                expr.push_str("(?:/.*)?");
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix("**") {
                expr.push_str(".*");
                rest = tail;
            } else if let Some(tail) = rest.strip_prefix('*') {
                expr.push_str("[^/]*");
                rest = tail;
            } else {
                let ch = rest.chars().next().unwrap_or_default();
                expr.push_str(&regex::escape(&ch.to_string()));
                rest = &rest[ch.len_utf8()..];
            }
        }
        expr.push('$');

        Ok(Self {
            raw: pattern.to_string(),
            regex: Regex::new(&expr)?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// 授权规则
#[derive(Debug, Clone)]
pub struct AuthorizationRule {
    pub patterns: Vec<PathPattern>,
    pub access: Access,
}

impl AuthorizationRule {
    pub fn new(patterns: &[&str], access: Access) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| PathPattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns, access })
    }

    fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }
}

/// 安全配置
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// 上下文路径，匹配规则前会先去掉
    pub context_path: String,
    /// 按顺序匹配，先匹配者生效
    pub rules: Vec<AuthorizationRule>,
    /// 未匹配任何规则时的访问要求
    pub default_access: Access,
    pub users: Arc<InMemoryUserStore>,
    pub realm: String,
}

impl SecurityConfig {
    /// 默认规则
    pub fn new(context_path: &str, users: Arc<InMemoryUserStore>) -> Result<Self, regex::Error> {
        let roles = |names: &[&str]| names.iter().map(|r| r.to_string()).collect::<Vec<_>>();
        let rules = vec![
            AuthorizationRule::new(&["/", "/status", "/v3/api-docs/**"], Access::PermitAll)?,
            AuthorizationRule::new(&["/swagger-ui/**"], Access::AnyRole(roles(&["USER", "ADMIN"])))?,
            AuthorizationRule::new(&["/actuator/**", "/admin/**"], Access::AnyRole(roles(&["ADMIN"])))?,
        ];

        Ok(Self {
            context_path: context_path.to_string(),
            rules,
            default_access: Access::Authenticated,
            users,
            realm: "traverse".to_string(),
        })
    }

    /// 获取路径对应的访问要求
    pub fn access_for(&self, path: &str) -> &Access {
        let relative = self.relative_path(path);
        self.rules
            .iter()
            .find(|rule| rule.matches(relative))
            .map(|rule| &rule.access)
            .unwrap_or(&self.default_access)
    }

    fn relative_path<'a>(&self, path: &'a str) -> &'a str {
        if self.context_path.is_empty() {
            return path;
        }
        match path.strip_prefix(self.context_path.as_str()) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

impl Component for SecurityConfig {
    const NAME: &'static str = "securityConfig";
    const RESOURCE: &'static str = file!();

    fn aliases() -> &'static [&'static str] {
        &["inMemoryUserDetailsManager"]
    }

    fn configured_fields() -> &'static [(&'static str, &'static str)] {
        &[
            ("context_path", "${server.context_path}"),
            ("users", "${security.users}"),
        ]
    }
}

/// 认证结果
enum Credentials {
    Missing,
    Invalid,
    Valid(Principal),
}

/// 解析 `Authorization: Basic ...` 请求头；其他认证方案视为未携带凭证
fn resolve_credentials(req: &ServiceRequest, users: &InMemoryUserStore) -> Credentials {
    let Some((scheme, encoded)) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim_start().split_once(' '))
    else {
        return Credentials::Missing;
    };
    if !scheme.eq_ignore_ascii_case("Basic") {
        return Credentials::Missing;
    }
    let decoded = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());
    let Some((username, password)) = decoded.as_deref().and_then(|s| s.split_once(':')) else {
        return Credentials::Invalid;
    };
    match users.authenticate(username, password) {
        Some(principal) => Credentials::Valid(principal),
        None => Credentials::Invalid,
    }
}

/// 安全中间件：HTTP Basic 认证 + 基于路径的角色授权
pub struct SecurityMiddleware {
    config: Rc<SecurityConfig>,
}

impl SecurityMiddleware {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config: Rc::new(config),
        }
    }
}

impl<S> Transform<S, ServiceRequest> for SecurityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = SecurityMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityMiddlewareService {
            service: Rc::new(service),
            config: self.config.clone(),
        }))
    }
}

pub struct SecurityMiddlewareService<S> {
    service: Rc<S>,
    config: Rc<SecurityConfig>,
}

impl<S> SecurityMiddlewareService<S> {
    fn unauthorized(config: &SecurityConfig, req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
        let mut response = AppError::auth(message).error_response();
        if let Ok(value) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", config.realm)) {
            response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
        }
        req.into_response(response)
    }
}

impl<S> Service<ServiceRequest> for SecurityMiddlewareService<S>
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
            let path = req.path().to_string();
            let method = req.method().clone();
            let access = config.access_for(&path).clone();
            debug!("安全检查: {} {} -> {:?}", method, path, access);

            // 携带了错误凭证时，即使路径放行也拒绝
            let principal = match resolve_credentials(&req, &config.users) {
                Credentials::Valid(principal) => Some(principal),
                Credentials::Missing => None,
                Credentials::Invalid => {
                    warn!("认证失败: {} {}", method, path);
                    return Ok(Self::unauthorized(&config, req, "用户名或密码错误 / Bad credentials"));
                }
            };

            match (&access, &principal) {
                (Access::PermitAll, _) => {}
                (_, None) => {
                    debug!("未认证访问受保护路径: {} {}", method, path);
                    return Ok(Self::unauthorized(&config, req, "需要认证 / Full authentication is required"));
                }
                (Access::AnyRole(roles), Some(principal)) if !principal.has_any_role(roles) => {
                    warn!("用户 {} 无权访问 {} {}", principal.name, method, path);
                    let response = AppError::permission("拒绝访问 / Access is denied").error_response();
                    return Ok(req.into_response(response));
                }
                _ => {}
            }

            if let Some(principal) = principal {
                req.extensions_mut().insert(principal);
            }

            service.call(req).await
        })
    }
}
