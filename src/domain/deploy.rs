//! 部署相关领域模型

use chrono::{DateTime, Utc};

/// 一次 reconcile 的结果，只存活于当前周期
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeployOutcome {
    /// 拉取前后提交相同
    NoChange,
    /// 构建、安装、重启全部成功
    Deployed,
    /// 某个阶段失败，原因中包含阶段名
    Failed(String),
}

impl DeployOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeployOutcome::NoChange => "no_change",
            DeployOutcome::Deployed => "deployed",
            DeployOutcome::Failed(_) => "failed",
        }
    }
}

/// 阶段状态
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Running,
    Success,
    Failed,
}

/// 部署阶段信息
#[derive(Clone, Debug)]
pub struct DeployStage {
    /// 阶段标识 (e.g., "pull", "build", "restart")
    pub name: &'static str,
    pub started_at: DateTime<Utc>,
    /// 持续时间（毫秒）
    pub duration_ms: Option<i64>,
    pub status: StageStatus,
}

impl DeployStage {
    /// 创建并立即开始一个阶段
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            started_at: Utc::now(),
            duration_ms: None,
            status: StageStatus::Running,
        }
    }

    /// 完成阶段
    pub fn finish(&mut self, success: bool) {
        self.status = if success {
            StageStatus::Success
        } else {
            StageStatus::Failed
        };
        self.duration_ms = Some((Utc::now() - self.started_at).num_milliseconds());
    }
}

/// 单个环境一次 reconcile 的记录
#[derive(Clone, Debug)]
pub struct DeployReport {
    pub branch: String,
    pub outcome: DeployOutcome,
    /// 拉取前的提交
    pub before: Option<String>,
    /// 拉取后的提交
    pub after: Option<String>,
    pub stages: Vec<DeployStage>,
}

impl DeployReport {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            outcome: DeployOutcome::NoChange,
            before: None,
            after: None,
            stages: Vec::new(),
        }
    }

    /// 最后到达的阶段
    pub fn last_stage(&self) -> Option<&'static str> {
        self.stages.last().map(|s| s.name)
    }

    /// 所有阶段耗时总和（毫秒）
    pub fn total_duration_ms(&self) -> i64 {
        self.stages.iter().filter_map(|s| s.duration_ms).sum()
    }
}

/// 提交哈希的前 8 位
pub fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
