use crate::bootstrap::component_registry::Component;
use crate::comm::config::ConfigManager;
use std::sync::Arc;

/// 运行环境：应用名、激活的 profile 与已加载的配置
#[derive(Debug, Clone)]
pub struct Environment {
    pub app_name: String,
    pub active_profiles: Vec<String>,
    pub config: Arc<ConfigManager>,
}

impl Environment {
    pub fn new(app_name: impl Into<String>, active_profiles: Vec<String>, config: Arc<ConfigManager>) -> Self {
        Self {
            app_name: app_name.into(),
            active_profiles,
            config,
        }
    }

    /// 列表展示格式，如 `[dev, local]`，无 profile 时为 `[]`
    pub fn profiles_display(&self) -> String {
        format!("[{}]", self.active_profiles.join(", "))
    }
}

impl Component for Environment {
    const NAME: &'static str = "environment";
    const RESOURCE: &'static str = file!();
}
