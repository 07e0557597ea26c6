use anyhow::Result;
use chrono::{Datelike, Timelike};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

struct LogTimer;

impl fmt::time::FormatTime for LogTimer {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = chrono::Local::now();
        let cs = now.timestamp_subsec_millis() / 10;
        let s = format!(
            "{:04}-{:02}-{:02}:{:02}:{:02}:{:02}:{:02}",
            now.year(),
            now.month(),
            now.day(),
            now.hour(),
            now.minute(),
            now.second(),
            cs
        );
        w.write_str(&s)
    }
}

/// 初始化日志
///
/// `RUST_LOG` 优先于配置中的 `logging.level`；`json_format` 为真时输出 Bunyan JSON。
/// 重复初始化时静默忽略（测试中会多次调用）。
pub fn init_tracing(app_name: &str, level: &str, json_format: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},actix_web=info", level)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json_format {
        let formatting_layer = BunyanFormattingLayer::new(app_name.to_string(), std::io::stdout);
        Registry::default()
            .with(filter)
            .with(JsonStorageLayer)
            .with(formatting_layer)
            .try_init()
            .ok();
    } else {
        fmt::SubscriberBuilder::default()
            .with_env_filter(filter)
            .with_timer(LogTimer)
            .compact()
            .with_target(false)
            .try_init()
            .ok();
    }
    Ok(())
}
