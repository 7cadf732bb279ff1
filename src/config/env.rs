//! 环境变量覆盖
//!
//! 密钥类配置可以不写进配置文件，改由环境变量提供。

use tracing::{info, warn};

use crate::config::settings::AgentConfig;

/// 用环境变量覆盖配置文件中的密钥
///
/// - `DEPLOY_GIT_TOKEN`（兼容旧名 `GIT_TOKEN`）覆盖 `git_config.token`
/// - `DEPLOY_WEBHOOK_URL` 覆盖 `slack.webhook_url`
pub fn apply_overrides<F>(config: &mut AgentConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if lookup("GIT_TOKEN").is_some() && lookup("DEPLOY_GIT_TOKEN").is_none() {
        warn!("Deprecated environment variable GIT_TOKEN detected. Please use DEPLOY_GIT_TOKEN");
    }

    if let Some(token) = load_with_fallback(&lookup, "DEPLOY_GIT_TOKEN", "GIT_TOKEN") {
        info!("Git token overridden from environment");
        config.git.token = token;
    }

    if let Some(url) = lookup("DEPLOY_WEBHOOK_URL").filter(|s| !s.is_empty()) {
        info!("Webhook URL overridden from environment");
        config.notify.webhook_url = url;
    }
}

/// 加载环境变量，支持 fallback
fn load_with_fallback<F>(lookup: &F, primary: &str, fallback: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(primary)
        .or_else(|| lookup(fallback))
        .filter(|s| !s.is_empty())
}

/// 常量
pub mod constants {
    /// Webhook 请求超时（秒）
    pub const NOTIFY_TIMEOUT_SECS: u64 = 5;

    /// 默认配置文件
    pub const DEFAULT_CONFIG_PATH: &str = "config.json";

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
