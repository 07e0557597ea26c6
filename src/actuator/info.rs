//! `/actuator/info`：profile、路由表与组件信息
//! Diagnostics payload built from the live route table and component registry

use crate::bootstrap::component_registry::{Component, ComponentRegistry, ConfiguredField};
use crate::bootstrap::environment::Environment;
use crate::bootstrap::route_registry::{RouteEntry, RouteRegistry};
use crate::comm::starts_with_any;
use crate::error::{AppError, AppResult};
use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// 激活的 profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub active_profiles: String,
}

/// 单个控制器的路由
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerMappings {
    /// 控制器的完整类型名
    pub controller: String,
    pub request_mappings: Vec<RouteEntry>,
}

/// 组件描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    pub aliases: BTreeSet<String>,
    pub scope: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub resource: String,
    pub dependencies: Vec<String>,
    pub configured_fields: Vec<ConfiguredField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoPayload {
    pub profile: ProfileSnapshot,
    pub mappings: BTreeMap<String, ControllerMappings>,
    pub beans: BTreeMap<String, ComponentDescriptor>,
}

/// 构建 info 信息；组件按类型所在模块前缀过滤
#[derive(Debug, Clone)]
pub struct InfoContributor {
    packages_to_include: Vec<String>,
}

impl InfoContributor {
    pub fn new(packages_to_include: Vec<String>) -> Self {
        Self {
            packages_to_include,
        }
    }

    /// 任一环节失败即整体失败，不返回部分结果
    pub fn contribute(
        &self,
        env: &Environment,
        routes: &RouteRegistry,
        components: &ComponentRegistry,
    ) -> AppResult<InfoPayload> {
        debug!("构建 info 信息");
        let payload = InfoPayload {
            profile: self.profile(env),
            mappings: self.mappings(routes, components).map_err(|e| {
                error!("构建路由信息失败: {}", e);
                e
            })?,
            beans: self.beans(components).map_err(|e| {
                error!("构建组件信息失败: {}", e);
                e
            })?,
        };
        trace!("info 信息: {:?}", payload);
        Ok(payload)
    }

    fn profile(&self, env: &Environment) -> ProfileSnapshot {
        ProfileSnapshot {
            active_profiles: env.profiles_display(),
        }
    }

    fn mappings(
        &self,
        routes: &RouteRegistry,
        components: &ComponentRegistry,
    ) -> AppResult<BTreeMap<String, ControllerMappings>> {
        let mut mappings: BTreeMap<String, ControllerMappings> = BTreeMap::new();

        for route in routes.get_routes() {
            let definition = components.get(&route.controller).ok_or_else(|| {
                AppError::introspection(format!(
                    "路由 {:?} {} 所属控制器 '{}' 未注册",
                    route.entry.method, route.entry.path, route.controller
                ))
            })?;
            if mappings.contains_key(&definition.name) {
                continue;
            }

            mappings.insert(
                definition.name.clone(),
                ControllerMappings {
                    controller: definition.type_name.clone(),
                    request_mappings: routes
                        .get_routes_by_controller(&route.controller)
                        .into_iter()
                        .cloned()
                        .collect(),
                },
            );
        }

        Ok(mappings)
    }

    fn beans(&self, components: &ComponentRegistry) -> AppResult<BTreeMap<String, ComponentDescriptor>> {
        let mut beans = BTreeMap::new();

        for definition in components.iter() {
            let namespace = definition.namespace().ok_or_else(|| {
                AppError::introspection(format!(
                    "组件 '{}' 的类型 '{}' 没有模块路径",
                    definition.name, definition.type_name
                ))
            })?;

            if !starts_with_any(namespace, &self.packages_to_include) {
                continue;
            }

            if let Some(missing) = definition
                .dependencies
                .iter()
                .find(|dependency| !components.contains(dependency))
            {
                return Err(AppError::introspection(format!(
                    "组件 '{}' 依赖的组件 '{}' 未注册",
                    definition.name, missing
                )));
            }

            beans.insert(
                definition.name.clone(),
                ComponentDescriptor {
                    aliases: definition.aliases.clone(),
                    scope: definition.scope.clone(),
                    type_name: definition.type_name.clone(),
                    resource: definition.resource.clone(),
                    dependencies: definition.dependencies.clone(),
                    configured_fields: definition.configured_fields.clone(),
                },
            );
        }

        Ok(beans)
    }
}

impl Component for InfoContributor {
    const NAME: &'static str = "customInfoContributor";
    const RESOURCE: &'static str = file!();

    fn dependencies() -> &'static [&'static str] {
        &["environment"]
    }

    fn configured_fields() -> &'static [(&'static str, &'static str)] {
        &[(
            "packages_to_include",
            "${application.actuator.bean.packages.to.include}",
        )]
    }
}

/// info 端点所需的只读数据
pub struct InfoState {
    pub contributor: InfoContributor,
    pub environment: Arc<Environment>,
    pub routes: Arc<RouteRegistry>,
    pub components: Arc<ComponentRegistry>,
}

/// 诊断信息端点
#[utoipa::path(
    get,
    path = "/actuator/info",
    tag = "Actuator",
    responses(
        (status = 200, description = "profile、路由与组件信息"),
        (status = 500, description = "诊断信息构建失败")
    )
)]
pub async fn info(state: web::Data<Arc<InfoState>>) -> AppResult<HttpResponse> {
    let payload = state
        .contributor
        .contribute(&state.environment, &state.routes, &state.components)?;
    Ok(HttpResponse::Ok().json(payload))
}
