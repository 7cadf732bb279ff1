//! 单个环境的部署 reconcile
//!
//! 读取提交 → 拉取 → 再读取提交，两次不同时才执行构建 → 安装 → 重启。
//! 不跨周期保存状态，变更检测只看同一周期内的前后两个哈希。

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::AgentConfig;
use crate::domain::{short_hash, DeployOutcome, DeployReport, DeployStage, Environment};
use crate::error::DeployError;
use crate::infra::{CommandExecutor, Notifier};

use super::pipeline::BuildPipeline;
use super::source::SourceTracker;

/// 调度器每个周期对每个环境调用一次
#[async_trait]
pub trait EnvironmentReconciler: Send + Sync {
    async fn reconcile(&self, env: &Environment) -> DeployReport;
}

pub struct Reconciler {
    tracker: SourceTracker,
    pipeline: BuildPipeline,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(tracker: SourceTracker, pipeline: BuildPipeline, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tracker,
            pipeline,
            notifier,
        }
    }

    /// tracker 和 pipeline 共用同一个执行器
    pub fn from_config(
        config: &AgentConfig,
        executor: Arc<dyn CommandExecutor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::new(
            SourceTracker::new(executor.clone(), config.git.clone()),
            BuildPipeline::new(executor, config.build.clone()),
            notifier,
        )
    }

    async fn attempt(
        &self,
        env: &Environment,
        report: &mut DeployReport,
    ) -> Result<DeployOutcome, DeployError> {
        let before = timed(report, "revision_before", self.tracker.current_revision(&env.dir)).await?;
        report.before = Some(before.clone());

        timed(report, "pull", self.tracker.pull_latest(&env.dir, &env.branch)).await?;

        let after = timed(report, "revision_after", self.tracker.current_revision(&env.dir)).await?;
        report.after = Some(after.clone());

        if before == after {
            return Ok(DeployOutcome::NoChange);
        }

        info!(
            before = %short_hash(&before),
            after = %short_hash(&after),
            "[{}] New commit detected. Building...",
            env.branch
        );
        let artifact = timed(report, "build", self.pipeline.build(&env.dir)).await?;

        info!(
            target = %self.pipeline.install_target(&env.service_name).display(),
            "[{}] Build succeeded. Installing...",
            env.branch
        );
        timed(
            report,
            "install",
            self.pipeline.install(&artifact, &env.service_name, &env.dir),
        )
        .await?;

        info!("[{}] Restarting {}...", env.branch, env.service_name);
        timed(report, "restart", self.pipeline.restart(&env.service_name, &env.dir)).await?;

        Ok(DeployOutcome::Deployed)
    }
}

#[async_trait]
impl EnvironmentReconciler for Reconciler {
    /// 不会返回错误：任何失败都变成 `Failed`，记录一行日志并通知一次
    async fn reconcile(&self, env: &Environment) -> DeployReport {
        info!("[{}] Checking for updates...", env.branch);

        let mut report = DeployReport::new(&env.branch);
        report.outcome = match self.attempt(env, &mut report).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(stage = e.stage_name(), "[{}] Error: {}", env.branch, e);
                DeployOutcome::Failed(e.to_string())
            }
        };

        match &report.outcome {
            DeployOutcome::NoChange => {
                info!("[{}] No new changes.", env.branch);
            }
            DeployOutcome::Deployed => {
                info!(
                    duration_ms = report.total_duration_ms(),
                    "[{}] Deploy completed successfully.",
                    env.branch
                );
                self.notifier.notify(&success_message(&env.branch)).await;
            }
            DeployOutcome::Failed(reason) => {
                self.notifier.notify(&failure_message(&env.branch, reason)).await;
            }
        }

        report
    }
}

/// 把 `step` 记录为一个阶段，原样返回结果
async fn timed<T, F>(report: &mut DeployReport, name: &'static str, step: F) -> Result<T, DeployError>
where
    F: Future<Output = Result<T, DeployError>>,
{
    let mut stage = DeployStage::start(name);
    let result = step.await;
    stage.finish(result.is_ok());
    report.stages.push(stage);
    result
}

pub fn success_message(branch: &str) -> String {
    format!(
        ":rocket: [{}] Deploy successful at {}",
        branch,
        chrono::Local::now().format("%d %b %y %H:%M %Z")
    )
}

pub fn failure_message(branch: &str, reason: &str) -> String {
    format!(":x: [{}] Deploy error: {}", branch, reason)
}
