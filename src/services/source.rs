//! 源码跟踪
//!
//! 读取本地仓库的当前提交，并从远端拉取配置的分支。

use std::path::Path;
use std::sync::Arc;

use crate::domain::RepositoryCredentials;
use crate::error::{DeployError, TrackerStage};
use crate::infra::CommandExecutor;

/// git pull 因冲突中止时输出的标记
const CONFLICT_MARKERS: [&str; 2] = ["CONFLICT", "Automatic merge failed"];

/// 通过 `git` 查询和更新工作副本
pub struct SourceTracker {
    executor: Arc<dyn CommandExecutor>,
    credentials: RepositoryCredentials,
}

impl SourceTracker {
    pub fn new(executor: Arc<dyn CommandExecutor>, credentials: RepositoryCredentials) -> Self {
        Self {
            executor,
            credentials,
        }
    }

    /// `dir` 的当前提交哈希
    pub async fn current_revision(&self, dir: &Path) -> Result<String, DeployError> {
        let output = self
            .executor
            .run("git", &["rev-parse", "HEAD"], dir)
            .await
            .map_err(|e| self.error(TrackerStage::Revision, &e.to_string()))?;

        if !output.success {
            return Err(self.error(TrackerStage::Revision, &output.diagnostic()));
        }

        let hash = output.trimmed();
        if hash.is_empty() {
            return Err(self.error(TrackerStage::Revision, "git rev-parse returned no output"));
        }
        Ok(hash.to_string())
    }

    /// 把 `origin` 指向配置的仓库，然后拉取 `branch`
    ///
    /// 每次都改写 URL，凭据轮换后无需手动修改仓库；重复调用结果相同。
    pub async fn pull_latest(&self, dir: &Path, branch: &str) -> Result<(), DeployError> {
        let remote_url = self
            .credentials
            .remote_url()
            .map_err(|e| self.error(TrackerStage::SetRemote, &format!("invalid remote URL: {}", e)))?;

        let output = self
            .executor
            .run("git", &["remote", "set-url", "origin", &remote_url], dir)
            .await
            .map_err(|e| self.error(TrackerStage::SetRemote, &e.to_string()))?;
        if !output.success {
            return Err(self.error(TrackerStage::SetRemote, &output.diagnostic()));
        }

        let output = self
            .executor
            .run("git", &["pull", "origin", branch], dir)
            .await
            .map_err(|e| self.error(TrackerStage::Pull, &e.to_string()))?;
        if !output.success {
            let stage = if is_merge_conflict(&output.output) {
                TrackerStage::MergeConflict
            } else {
                TrackerStage::Pull
            };
            return Err(self.error(stage, &output.diagnostic()));
        }

        Ok(())
    }

    fn error(&self, stage: TrackerStage, diagnostic: &str) -> DeployError {
        DeployError::tracker(stage, self.credentials.redact(diagnostic))
    }
}

fn is_merge_conflict(output: &str) -> bool {
    CONFLICT_MARKERS.iter().any(|m| output.contains(m))
}
