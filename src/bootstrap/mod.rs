//! 启动与装配：命令行、应用上下文、组件与路由注册表
//! Bootstrap: CLI, application context, component and route registries

pub mod app_bootstrap;
pub mod app_context;
pub mod cli;
pub mod component_registry;
pub mod environment;
pub mod route_registry;

pub use app_bootstrap::{launch, AppBootstrap};
pub use app_context::AppContext;
pub use component_registry::{Component, ComponentDefinition, ComponentRegistry};
pub use environment::Environment;
pub use route_registry::{RequestMethod, RouteEntry, RouteRegistry};
