//! 健康检查
//! Health indicators and their aggregation

use crate::bootstrap::component_registry::Component;
use crate::comm::config_validator::DownstreamConfig;
use crate::error::{AppError, AppResult};
use actix_web::{http::StatusCode, web, HttpResponse};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 健康状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Up,
    Down,
}

/// 单个组件的健康结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Health {
    pub status: Status,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl Health {
    pub fn up() -> Self {
        Self {
            status: Status::Up,
            details: Map::new(),
        }
    }

    pub fn down() -> Self {
        Self {
            status: Status::Down,
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_exception(self, error: impl std::fmt::Display) -> Self {
        self.with_detail("exception", error.to_string())
    }

    pub fn is_up(&self) -> bool {
        self.status == Status::Up
    }
}

/// 健康检查通用接口
/// Generic health check interface
#[async_trait]
pub trait HealthIndicator: Send + Sync {
    /// 执行检查；失败折叠为 DOWN，不返回错误
    async fn health(&self) -> Health;
}

/// 存活探测，始终 UP
pub struct PingHealthIndicator;

#[async_trait]
impl HealthIndicator for PingHealthIndicator {
    async fn health(&self) -> Health {
        Health::up()
    }
}

/// 下游服务探测：GET 配置的 URL，2xx 视为健康
pub struct DownstreamHealthIndicator {
    client: reqwest::Client,
    config: DownstreamConfig,
}

impl DownstreamHealthIndicator {
    pub fn new(config: DownstreamConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| AppError::external_service(&config.url, format!("创建 HTTP 客户端失败: {}", e)))?;
        Ok(Self { client, config })
    }

    /// 传输层失败时按指数退避重试；拿到任何 HTTP 状态都直接返回
    async fn fetch_status(&self) -> Result<reqwest::StatusCode, reqwest::Error> {
        let mut attempt: u32 = 0;
        loop {
            match self.client.get(&self.config.url).send().await {
                Ok(response) => return Ok(response.status()),
                Err(e) if attempt < self.config.retries => {
                    let delay = self.config.backoff_ms.saturating_mul(1u64 << attempt.min(16));
                    warn!(
                        "下游探测失败 (第 {} 次)，{}ms 后重试: {} - {}",
                        attempt + 1,
                        delay,
                        self.config.url,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl HealthIndicator for DownstreamHealthIndicator {
    async fn health(&self) -> Health {
        match self.fetch_status().await {
            Ok(status) if status.is_success() => {
                debug!("下游服务正常: {} -> {}", self.config.url, status);
                Health::up()
            }
            Ok(status) => {
                warn!("下游服务异常: {} -> {}", self.config.url, status);
                Health::down().with_detail("status", status.as_u16())
            }
            Err(e) => {
                warn!("下游服务不可达: {} - {}", self.config.url, e);
                Health::down().with_exception(e)
            }
        }
    }
}

impl Component for DownstreamHealthIndicator {
    const NAME: &'static str = "downstream-google";
    const RESOURCE: &'static str = file!();

    fn configured_fields() -> &'static [(&'static str, &'static str)] {
        &[("downstream_url", "${application.actuator.downstream.service.url}")]
    }
}

/// 聚合结果
#[derive(Debug, Clone, Serialize)]
pub struct CompositeHealth {
    pub status: Status,
    pub components: BTreeMap<String, Health>,
}

/// 健康检查注册表
#[derive(Default)]
pub struct HealthRegistry {
    indicators: Vec<(String, Arc<dyn HealthIndicator>)>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, indicator: Arc<dyn HealthIndicator>) -> &mut Self {
        self.indicators.push((name.into(), indicator));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indicators.iter().map(|(name, _)| name.as_str())
    }

    /// 并发执行所有检查；任一 DOWN 则整体 DOWN
    pub async fn check(&self) -> CompositeHealth {
        let results = join_all(
            self.indicators
                .iter()
                .map(|(name, indicator)| async move { (name.clone(), indicator.health().await) }),
        )
        .await;

        let status = if results.iter().all(|(_, health)| health.is_up()) {
            Status::Up
        } else {
            Status::Down
        };

        CompositeHealth {
            status,
            components: results.into_iter().collect(),
        }
    }
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/actuator/health",
    tag = "Actuator",
    responses(
        (status = 200, description = "所有组件 UP"),
        (status = 503, description = "存在 DOWN 组件")
    )
)]
pub async fn health(registry: web::Data<Arc<HealthRegistry>>) -> HttpResponse {
    let health = registry.check().await;
    let status = match health.status {
        Status::Up => StatusCode::OK,
        Status::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    HttpResponse::build(status).json(health)
}
