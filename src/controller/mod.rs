//! 控制器
//! Controllers

pub mod home;
pub mod status;
pub mod traverse;

use crate::bootstrap::component_registry::ComponentRegistry;
use crate::bootstrap::route_registry::RouteRegistry;

pub use home::HomeController;
pub use status::StatusController;
pub use traverse::TraverseController;

/// 注册所有控制器路由
pub fn register_routes(routes: &mut RouteRegistry) {
    routes.controller::<HomeController>().get("/", home::hello);
    routes.controller::<StatusController>().get("/status", status::status);
    routes
        .controller::<TraverseController>()
        .get("/api/v1/traverse", traverse::traverse);
}

/// 注册所有控制器组件
pub fn register_components(components: &mut ComponentRegistry) {
    components
        .register::<HomeController>()
        .register::<StatusController>()
        .register::<TraverseController>();
}
