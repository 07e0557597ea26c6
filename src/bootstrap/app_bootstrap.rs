use actix_web::{middleware::Logger, App, HttpServer};
use tracing::{error, info, instrument};

use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::cli::{self, CliCommand, ServerArgs};
use crate::comm::config_validator::{AppConfiguration, ConfigValidator};
use crate::comm::enhanced_config::EnhancedConfigManager;
use crate::comm::tracing::init_tracing;
use crate::error::{AppError, AppResult};
use std::sync::Arc;

/// 应用启动器
pub struct AppBootstrap {
    config: AppConfiguration,
    context: Arc<AppContext>,
}

impl AppBootstrap {
    /// 创建新的应用启动器
    pub fn new(config_manager: &EnhancedConfigManager) -> AppResult<Self> {
        let config = config_manager.get_app_config().clone();
        let context = AppContext::build(&config, config_manager.get_config_manager())?;
        Ok(Self {
            config,
            context: Arc::new(context),
        })
    }

    /// 运行应用服务器，直到服务器退出
    #[instrument(skip(self), fields(app = %self.config.app_name))]
    pub async fn run(self) -> AppResult<()> {
        let config = self.config;
        let context = self.context;
        info!(
            "启动应用服务器: {}:{}{}",
            config.server_host, config.server_port, config.server_context_path
        );
        context.routes.print_routes_info();

        let app_context = context.clone();
        let mut server = HttpServer::new(move || {
            let context = app_context.clone();
            App::new()
                .wrap(context.security())
                .wrap(context.cors())
                .wrap(Logger::default())
                .configure(|cfg| context.configure(cfg))
        });
        if let Some(workers) = config.server_workers {
            server = server.workers(workers);
        }

        let server = server
            .bind((config.server_host.as_str(), config.server_port))
            .map_err(|e| {
                error!("绑定 {}:{} 失败: {}", config.server_host, config.server_port, e);
                AppError::Internal(anyhow::Error::new(e))
            })?;
        let port = server
            .addrs()
            .first()
            .map(|addr| addr.port())
            .unwrap_or(config.server_port);

        // 主机名解析失败只影响提示信息，不影响服务
        if let Err(e) = log_endpoints_of_interest(port, &config.server_context_path) {
            error!("构建启动提示地址失败: {}", e);
        }

        server
            .run()
            .await
            .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

        info!("服务器已停止");
        Ok(())
    }
}

/// 启动后输出常用地址
pub fn log_endpoints_of_interest(port: u16, context_path: &str) -> AppResult<String> {
    let hostname = sys_info::hostname()
        .map_err(|e| AppError::external_service("hostname", e.to_string()))?;
    let base_url = format!("http://{}:{}{}", hostname, port, context_path);

    let banner = format!(
        "Web server ready and waiting, good luck out there!\n\
         \n\t\tEnd points of interest:\
         \n\t\t\thome -> {base}\
         \n\t\t\tinfo -> {base}/actuator/info\
         \n\t\t\tenvironment -> {base}/actuator/env\
         \n\t\t\thealth -> {base}/actuator/health\
         \n\t\t\tactuator -> {base}/actuator\n",
        base = base_url
    );
    info!("{}", banner);
    Ok(banner)
}

/// 加载配置并应用命令行覆盖
fn load_configuration(default_name: &str, args: &ServerArgs) -> AppResult<EnhancedConfigManager> {
    let mut config_manager = EnhancedConfigManager::new()?;
    let has_name = config_manager
        .get_config_manager()
        .exists("application.name");

    let app_config = config_manager.get_app_config_mut();
    if !has_name {
        app_config.app_name = default_name.to_string();
    }
    if let Some(host) = &args.host {
        app_config.server_host = host.clone();
    }
    if let Some(port) = args.port {
        app_config.server_port = port;
    }
    if let Some(workers) = args.workers {
        app_config.server_workers = Some(workers);
    }
    ConfigValidator::new().validate_config(app_config)?;

    Ok(config_manager)
}

/// 入口：解析命令行，加载配置，初始化日志并启动服务
pub async fn launch(default_name: &'static str) -> anyhow::Result<()> {
    let matches = cli::build_app(default_name).get_matches();

    match cli::parse_command(&matches) {
        CliCommand::Version => {
            cli::print_version(default_name);
            Ok(())
        }
        CliCommand::Server(args) => {
            let config_manager = load_configuration(default_name, &args)?;
            let app_config = config_manager.get_app_config();
            init_tracing(
                &app_config.app_name,
                &app_config.logging_level,
                app_config.logging_json_format,
            )?;
            config_manager.print_config_summary();

            AppBootstrap::new(&config_manager)?.run().await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_lists_endpoints() {
        // 容器中主机名可能不可用，此时只验证错误类型
        match log_endpoints_of_interest(8080, "/koat") {
            Ok(banner) => {
                assert!(banner.starts_with("Web server ready and waiting, good luck out there!"));
                assert!(banner.contains(":8080/koat/actuator/info"));
                assert!(banner.contains(":8080/koat/actuator/health"));
            }
            Err(e) => assert!(matches!(e, AppError::ExternalService { .. })),
        }
    }
}
