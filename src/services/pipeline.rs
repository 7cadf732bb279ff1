//! 构建与安装流水线
//!
//! 编译工作副本，把二进制复制到安装目录，再重启 systemd 服务。
//! 各步骤不重试，第一次失败即结束本次部署。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::BuildConfig;
use crate::error::{CommandError, DeployError};
use crate::infra::{CommandExecutor, CommandOutput};

pub struct BuildPipeline {
    executor: Arc<dyn CommandExecutor>,
    config: BuildConfig,
}

impl BuildPipeline {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: BuildConfig) -> Self {
        Self { executor, config }
    }

    /// 构建产物在 `dir` 下的路径
    pub fn artifact_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.config.artifact_name)
    }

    /// `service_name` 安装后的路径
    pub fn install_target(&self, service_name: &str) -> PathBuf {
        self.config.install_dir.join(service_name)
    }

    /// 构建配置的源码子目录，返回产物路径
    pub async fn build(&self, dir: &Path) -> Result<PathBuf, DeployError> {
        let artifact = self.artifact_path(dir);
        let source = dir.join(&self.config.source_subpath);
        let artifact_str = artifact.to_string_lossy();
        let source_str = source.to_string_lossy();

        let args: Vec<String> = self
            .config
            .build_args
            .iter()
            .map(|arg| {
                arg.replace("{output}", &artifact_str)
                    .replace("{source}", &source_str)
            })
            .collect();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let result = self.executor.run(&self.config.toolchain, &args, dir).await;
        check(result, DeployError::Build)?;
        Ok(artifact)
    }

    /// 以服务名把 `artifact` 复制到安装目录
    pub async fn install(
        &self,
        artifact: &Path,
        service_name: &str,
        dir: &Path,
    ) -> Result<(), DeployError> {
        let target = self.install_target(service_name);
        let artifact = artifact.to_string_lossy();
        let target = target.to_string_lossy();

        let result = self.privileged(&["cp", &*artifact, &*target], dir).await;
        check(result, DeployError::Install)
    }

    /// 通过服务管理器重启 `service_name`
    pub async fn restart(&self, service_name: &str, dir: &Path) -> Result<(), DeployError> {
        let manager = self.config.service_manager.as_str();
        let result = self
            .privileged(&[manager, "restart", service_name], dir)
            .await;
        check(result, DeployError::Restart)
    }

    /// 配置了提权命令时经由它执行，否则直接执行
    async fn privileged(
        &self,
        command: &[&str],
        dir: &Path,
    ) -> Result<CommandOutput, CommandError> {
        let wrapper = self.config.privilege_command.trim();
        match command.split_first() {
            Some((program, args)) if wrapper.is_empty() => {
                self.executor.run(program, args, dir).await
            }
            _ => self.executor.run(wrapper, command, dir).await,
        }
    }
}

fn check(
    result: Result<CommandOutput, CommandError>,
    wrap: fn(String) -> DeployError,
) -> Result<(), DeployError> {
    match result {
        Ok(output) if output.success => Ok(()),
        Ok(output) => Err(wrap(failure_text(&output))),
        Err(e) => Err(wrap(e.to_string())),
    }
}

/// "exit status N - <output>"，没有输出时只有退出码
fn failure_text(output: &CommandOutput) -> String {
    let status = match output.exit_code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    };
    match output.trimmed() {
        "" => status,
        text => format!("{} - {}", status, text),
    }
}
