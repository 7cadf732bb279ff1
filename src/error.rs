//! 统一错误处理
//!
//! 每个部署阶段都有自己的错误变体，携带外部工具的诊断输出。
//! Reconciler 把所有错误转换成一条日志 + 一条通知，不会继续向上传播。

use std::path::PathBuf;
use thiserror::Error;

/// Source Tracker 失败所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStage {
    /// 读取当前提交（git rev-parse HEAD）
    Revision,
    /// 改写 remote URL
    SetRemote,
    /// 拉取并合并分支
    Pull,
    /// 拉取时出现合并冲突
    MergeConflict,
}

impl TrackerStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerStage::Revision => "could not read commit hash",
            TrackerStage::SetRemote => "failed to set remote URL",
            TrackerStage::Pull => "git pull failed",
            TrackerStage::MergeConflict => "git pull hit a merge conflict",
        }
    }
}

impl std::fmt::Display for TrackerStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一次部署尝试中任一阶段的失败
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeployError {
    #[error("{stage}: {diagnostic}")]
    Tracker {
        stage: TrackerStage,
        diagnostic: String,
    },

    #[error("build failed: {0}")]
    Build(String),

    #[error("install failed: {0}")]
    Install(String),

    #[error("restart failed: {0}")]
    Restart(String),
}

impl DeployError {
    pub fn tracker(stage: TrackerStage, diagnostic: impl Into<String>) -> Self {
        Self::Tracker {
            stage,
            diagnostic: diagnostic.into(),
        }
    }

    /// 失败阶段的短名称，用于日志字段
    pub fn stage_name(&self) -> &'static str {
        match self {
            DeployError::Tracker { stage, .. } => match stage {
                TrackerStage::Revision => "revision",
                TrackerStage::SetRemote => "set_remote",
                TrackerStage::Pull => "pull",
                TrackerStage::MergeConflict => "merge_conflict",
            },
            DeployError::Build(_) => "build",
            DeployError::Install(_) => "install",
            DeployError::Restart(_) => "restart",
        }
    }
}

/// 外部命令无法启动或等待失败
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// 配置加载错误（启动阶段致命）
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Webhook 投递失败，只会被记录，永远不会传给调用方
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook returned non-OK status: {0}")]
    Status(reqwest::StatusCode),
}
