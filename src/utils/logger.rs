use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日誌輸出格式：互動使用 compact，批次交給收集器時用 json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// `RUST_LOG` 未設定時的過濾條件；verbose 時第三方 crate 仍保留在 info
fn default_directive(level: &str, verbose: bool) -> String {
    if verbose {
        "clearcut=debug,info".to_string()
    } else {
        format!("clearcut={}", level)
    }
}

fn env_filter(level: &str, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level, verbose)))
}

pub fn init(format: LogFormat, level: &str, verbose: bool) {
    let filter = env_filter(level, verbose);
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => registry
            .with(fmt::layer().with_target(false).compact())
            .init(),
        // 批次模式保留 target，方便依模組篩選
        LogFormat::Json => registry
            .with(fmt::layer().with_target(true).json())
            .init(),
    }
}

pub fn init_cli_logger(verbose: bool) {
    init(LogFormat::Compact, "info", verbose);
}
