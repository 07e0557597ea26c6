//! HTTP 中间件：安全认证与跨域
//! HTTP middleware: security and CORS

pub mod cors;
pub mod security;

pub use cors::{CorsConfig, CorsMiddleware};
pub use security::{Access, SecurityConfig, SecurityMiddleware};
