use crate::auth::{AuditorAware, SecurityContext};
use crate::bootstrap::component_registry::Component;
use actix_web::HttpResponse;
use tracing::info;

/// 遍历控制器
pub struct TraverseController;

impl Component for TraverseController {
    const NAME: &'static str = "traverseController";
    const RESOURCE: &'static str = file!();
}

#[utoipa::path(
    get,
    path = "/api/v1/traverse",
    tag = "Traverse",
    responses(
        (status = 200, description = "固定返回 success", body = String),
        (status = 401, description = "未认证")
    ),
    security(("basic_auth" = []))
)]
pub async fn traverse(context: SecurityContext) -> HttpResponse {
    info!(
        auditor = context.current_auditor().as_deref().unwrap_or("-"),
        "Traversing..."
    );
    HttpResponse::Ok().body("success")
}
