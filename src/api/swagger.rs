use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// HTTP Basic 认证
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
    }
}

/// OpenAPI 文档聚合
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Koat API",
        description = "Koat API",
        version = "v0.1",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::controller::home::hello,
        crate::controller::status::status,
        crate::controller::traverse::traverse,
        crate::actuator::links,
        crate::actuator::health::health,
        crate::actuator::info::info,
        crate::actuator::env::env,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Home", description = "首页"),
        (name = "Status", description = "应用状态"),
        (name = "Traverse", description = "业务接口"),
        (name = "Actuator", description = "运维诊断端点，需要 ADMIN 角色")
    )
)]
pub struct ApiDoc;

/// 文档地址，如 `/koat/v3/api-docs`
pub fn api_docs_path(context_path: &str) -> String {
    format!("{}/v3/api-docs", context_path)
}

/// Swagger UI 服务（使用通配路径以兼容静态资源与尾随斜杠）
pub fn swagger_ui(context_path: &str) -> SwaggerUi {
    SwaggerUi::new(format!("{}/swagger-ui/{{_:.*}}", context_path))
        .url(api_docs_path(context_path), ApiDoc::openapi())
}
