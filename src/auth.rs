//! 认证相关代码
//! Authentication related code

use crate::comm::config_validator::UserConfig;
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};
use std::collections::{BTreeSet, HashMap};

// ==================== 认证主体 ====================
// ==================== Principal ====================

/// 已认证用户
/// Authenticated principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// 是否拥有任一角色
    /// Whether the principal holds any of the given roles
    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|role| self.roles.contains(role.as_ref()))
    }
}

// ==================== 内存用户 ====================
// ==================== In-memory users ====================

#[derive(Debug, Clone)]
struct UserDetails {
    password: String,
    roles: BTreeSet<String>,
}

/// 内存用户存储（明文密码，仅限本地开发）
/// In-memory user store with plain-text ("noop") passwords, local development only
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: HashMap<String, UserDetails>,
}

impl InMemoryUserStore {
    pub fn new(users: &[UserConfig]) -> Self {
        tracing::warn!(
            "NoOp password encoder is being used with in memory authentication. THIS CONFIGURATION SHOULD NOT MAKE IT INTO A QA OR PROD ENVIRONMENT!!!"
        );
        let users = users
            .iter()
            .map(|user| {
                (
                    user.username.clone(),
                    UserDetails {
                        password: user.password.clone(),
                        roles: user.roles.iter().cloned().collect(),
                    },
                )
            })
            .collect();
        Self { users }
    }

    /// 校验用户名密码，成功返回认证主体
    /// Verify credentials, returning the principal on success
    pub fn authenticate(&self, username: &str, password: &str) -> Option<Principal> {
        self.users
            .get(username)
            .filter(|details| details.password == password)
            .map(|details| Principal {
                name: username.to_string(),
                roles: details.roles.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

// ==================== 安全上下文 ====================
// ==================== Security context ====================

/// 请求级安全上下文，由安全中间件写入请求扩展
/// Request-scoped security context, populated by the security middleware
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    authentication: Option<Principal>,
}

impl SecurityContext {
    pub fn new(authentication: Option<Principal>) -> Self {
        Self { authentication }
    }

    pub fn from_http_request(req: &HttpRequest) -> Self {
        Self::new(req.extensions().get::<Principal>().cloned())
    }

    pub fn authentication(&self) -> Option<&Principal> {
        self.authentication.as_ref()
    }
}

impl FromRequest for SecurityContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(SecurityContext::from_http_request(req)))
    }
}

// ==================== 审计 ====================
// ==================== Auditing ====================

/// 审计人解析：用于填充 created-by / modified-by
/// Resolves the current auditor for created-by / modified-by stamps
pub trait AuditorAware {
    fn current_auditor(&self) -> Option<String>;
}

impl AuditorAware for SecurityContext {
    fn current_auditor(&self) -> Option<String> {
        self.authentication.as_ref().map(|p| p.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;

    fn users() -> Vec<UserConfig> {
        vec![
            UserConfig {
                username: "user".to_string(),
                password: "user".to_string(),
                roles: vec!["USER".to_string()],
            },
            UserConfig {
                username: "admin".to_string(),
                password: "admin".to_string(),
                roles: vec!["USER".to_string(), "ADMIN".to_string()],
            },
        ]
    }

    #[test]
    fn test_authenticate() {
        let store = InMemoryUserStore::new(&users());
        assert_eq!(store.len(), 2);

        let admin = store.authenticate("admin", "admin").unwrap();
        assert_eq!(admin.name, "admin");
        assert!(admin.has_any_role(&["ADMIN"]));

        let user = store.authenticate("user", "user").unwrap();
        assert!(!user.has_any_role(&["ADMIN"]));
        assert!(user.has_any_role(&["ADMIN", "USER"]));

        assert!(store.authenticate("user", "wrong").is_none());
        assert!(store.authenticate("ghost", "user").is_none());
    }

    #[test]
    fn test_auditor_empty_without_authentication() {
        let context = SecurityContext::default();
        assert_eq!(context.current_auditor(), None);
    }

    #[test]
    fn test_auditor_returns_exact_principal_name() {
        let context = SecurityContext::new(Some(Principal::new("Jane Doe", ["USER"])));
        assert_eq!(context.current_auditor(), Some("Jane Doe".to_string()));
    }

    #[actix_web::test]
    async fn test_context_extracted_from_request_extensions() {
        let req = actix_test::TestRequest::default().to_http_request();
        assert!(SecurityContext::from_http_request(&req).authentication().is_none());

        req.extensions_mut().insert(Principal::new("admin", ["ADMIN"]));
        let context = SecurityContext::from_http_request(&req);
        assert_eq!(context.current_auditor(), Some("admin".to_string()));
    }
}
