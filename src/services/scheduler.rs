//! 轮询调度
//!
//! 按配置顺序逐个 reconcile 所有环境，然后等待下一次 tick。周期之间不会重叠。

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::domain::{short_hash, DeployOutcome, DeployReport, Environment};

use super::reconciler::EnvironmentReconciler;

/// 周期之间的等待
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self);
}

/// 固定间隔 sleep
pub struct IntervalTicker {
    interval: Duration,
}

impl IntervalTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        tokio::time::sleep(self.interval).await;
    }
}

/// 单个周期的结果统计
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub deployed: usize,
    pub unchanged: usize,
    pub failed: usize,
}

pub struct Scheduler<T: Ticker> {
    reconciler: Arc<dyn EnvironmentReconciler>,
    environments: Vec<Environment>,
    ticker: T,
}

impl<T: Ticker> Scheduler<T> {
    pub fn new(
        reconciler: Arc<dyn EnvironmentReconciler>,
        environments: Vec<Environment>,
        ticker: T,
    ) -> Self {
        Self {
            reconciler,
            environments,
            ticker,
        }
    }

    /// 处理一遍所有环境
    ///
    /// 每次 reconcile 在独立 task 中执行并等待完成后才开始下一个，
    /// panic 在这里被捕获，不会结束循环。
    pub async fn run_cycle(&self) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for env in &self.environments {
            let reconciler = self.reconciler.clone();
            let task_env = env.clone();
            let joined =
                tokio::spawn(async move { reconciler.reconcile(&task_env).await }).await;

            match joined {
                Ok(report) => {
                    log_report(&report);
                    match report.outcome {
                        DeployOutcome::NoChange => summary.unchanged += 1,
                        DeployOutcome::Deployed => summary.deployed += 1,
                        DeployOutcome::Failed(_) => summary.failed += 1,
                    }
                }
                Err(e) => {
                    error!(error = %e, "[{}] Reconcile aborted unexpectedly", env.branch);
                    summary.failed += 1;
                }
            }
        }

        info!(
            deployed = summary.deployed,
            unchanged = summary.unchanged,
            failed = summary.failed,
            "Cycle finished"
        );
        summary
    }

    /// 执行 `cycles` 个周期，每个周期后等待一次 tick
    pub async fn run_cycles(&mut self, cycles: usize) -> Vec<CycleSummary> {
        let mut summaries = Vec::with_capacity(cycles);
        for _ in 0..cycles {
            summaries.push(self.run_cycle().await);
            self.ticker.tick().await;
        }
        summaries
    }

    /// 一直运行直到进程退出
    pub async fn run_forever(&mut self) {
        info!(
            environments = self.environments.len(),
            "Starting deploy polling loop"
        );
        loop {
            self.run_cycle().await;
            self.ticker.tick().await;
        }
    }
}

/// 每个环境一行汇总
fn log_report(report: &DeployReport) {
    info!(
        outcome = report.outcome.as_str(),
        last_stage = report.last_stage().unwrap_or("none"),
        before = report.before.as_deref().map(short_hash).unwrap_or("-"),
        after = report.after.as_deref().map(short_hash).unwrap_or("-"),
        total_ms = report.total_duration_ms(),
        "[{}] Reconcile finished",
        report.branch
    );
}
