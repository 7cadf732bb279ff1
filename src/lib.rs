//! Git Deploy Agent - 轮询式持续部署代理
//!
//! 定期检查每个环境对应分支是否有新提交，有则构建、安装并重启服务，
//! 结果通过 webhook 通知。

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod logging;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

pub use config::AgentConfig;

use config::env::constants::VERSION;
use infra::{SystemCommandRunner, WebhookNotifier};
use services::{IntervalTicker, Reconciler, Scheduler};

/// 运行参数（来自命令行）
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// 只执行一个周期后退出
    pub once: bool,
}

/// 组装各组件并开始轮询
///
/// 只有 HTTP client 构建失败时返回错误；正常情况下 `once` 为 false 时永不返回。
pub async fn run_agent(config: AgentConfig, options: RunOptions) -> Result<(), reqwest::Error> {
    tracing::info!(
        version = VERSION,
        environments = config.environments.len(),
        interval_secs = config.interval_secs,
        notifications = config.notify.is_active(),
        "Starting git deploy agent"
    );

    let notifier = Arc::new(WebhookNotifier::new(config.notify.clone())?);
    let reconciler = Reconciler::from_config(&config, Arc::new(SystemCommandRunner), notifier);
    let ticker = IntervalTicker::new(Duration::from_secs(config.interval_secs));
    let mut scheduler = Scheduler::new(Arc::new(reconciler), config.environments.clone(), ticker);

    if options.once {
        scheduler.run_cycle().await;
    } else {
        scheduler.run_forever().await;
    }
    Ok(())
}
