use crate::bootstrap::component_registry::Component;
use actix_web::{http::header::ContentType, HttpResponse};
use tracing::warn;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// 首页控制器
pub struct HomeController;

impl Component for HomeController {
    const NAME: &'static str = "homeController";
    const RESOURCE: &'static str = file!();
}

/// 首页，返回静态 index.html
#[utoipa::path(
    get,
    path = "/",
    tag = "Home",
    responses((status = 200, description = "index.html 静态页面", content_type = "text/html"))
)]
pub async fn hello() -> HttpResponse {
    warn!(
        "Welcome home, the root end point '/' will need to be replaced eventually by a frontend. For now we return the index.html static page to gain access to points of interest"
    );
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}
