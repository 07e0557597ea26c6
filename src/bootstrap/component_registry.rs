use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// 默认作用域
pub const SCOPE_SINGLETON: &str = "singleton";

/// 通过配置表达式注入的字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfiguredField {
    /// 字段名
    pub field: String,
    /// 原始配置表达式，如 `${server.port}`（不解析）
    pub value: String,
}

/// 组件自描述接口
///
/// 启动时注册到 [`ComponentRegistry`]，`/actuator/info` 据此列出组件信息。
pub trait Component: 'static {
    /// 组件名称（注册表中的主键）
    const NAME: &'static str;
    /// 定义来源，一般为 `file!()`
    const RESOURCE: &'static str;

    fn aliases() -> &'static [&'static str] {
        &[]
    }

    fn scope() -> &'static str {
        SCOPE_SINGLETON
    }

    /// 依赖的其他组件名称
    fn dependencies() -> &'static [&'static str] {
        &[]
    }

    /// (字段名, 配置表达式)
    fn configured_fields() -> &'static [(&'static str, &'static str)] {
        &[]
    }
}

/// 组件定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDefinition {
    pub name: String,
    pub aliases: BTreeSet<String>,
    pub scope: String,
    pub type_name: String,
    pub resource: String,
    pub dependencies: Vec<String>,
    pub configured_fields: Vec<ConfiguredField>,
}

impl ComponentDefinition {
    /// 从实现了 [`Component`] 的类型构建定义
    pub fn of<T: Component>() -> Self {
        Self {
            name: T::NAME.to_string(),
            aliases: T::aliases().iter().map(|a| a.to_string()).collect(),
            scope: T::scope().to_string(),
            type_name: std::any::type_name::<T>().to_string(),
            resource: T::RESOURCE.to_string(),
            dependencies: T::dependencies().iter().map(|d| d.to_string()).collect(),
            configured_fields: T::configured_fields()
                .iter()
                .map(|(field, value)| ConfiguredField {
                    field: field.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }

    /// 类型所在的模块路径，例如 `traverse::actuator::health`
    ///
    /// 泛型参数不参与计算；没有 `::` 的类型返回 None。
    pub fn namespace(&self) -> Option<&str> {
        let base = self
            .type_name
            .split('<')
            .next()
            .unwrap_or(&self.type_name);
        base.rsplit_once("::").map(|(namespace, _)| namespace)
    }
}

/// 组件注册表：启动时写入，之后只读
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: BTreeMap<String, ComponentDefinition>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册组件类型
    pub fn register<T: Component>(&mut self) -> &mut Self {
        self.define(ComponentDefinition::of::<T>())
    }

    /// 直接注册组件定义；同名定义会被覆盖，空作用域回退为 singleton
    pub fn define(&mut self, mut definition: ComponentDefinition) -> &mut Self {
        if definition.scope.trim().is_empty() {
            definition.scope = SCOPE_SINGLETON.to_string();
        }
        if let Some(previous) = self.components.get(&definition.name) {
            tracing::warn!(
                "组件 '{}' 被重复注册: {} -> {}",
                definition.name,
                previous.type_name,
                definition.type_name
            );
        }
        self.components.insert(definition.name.clone(), definition);
        self
    }

    /// 按名称或别名查找
    pub fn get(&self, name: &str) -> Option<&ComponentDefinition> {
        self.components.get(name).or_else(|| {
            self.components
                .values()
                .find(|definition| definition.aliases.contains(name))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 按名称排序遍历
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDefinition> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
