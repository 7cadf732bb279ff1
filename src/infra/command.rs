//! 命令执行器
//!
//! 所有外部工具（git、构建工具、sudo、systemctl）都经由 `CommandExecutor` 调用，
//! 测试时替换为脚本化的假实现。

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// 命令执行结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    /// 退出码为 0
    pub success: bool,
    /// 退出码（被信号终止时为 None）
    pub exit_code: Option<i32>,
    /// stdout + stderr 合并输出
    pub output: String,
}

impl CommandOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            output: output.into(),
        }
    }

    pub fn failed(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            output: output.into(),
        }
    }

    /// 去掉首尾空白的输出
    pub fn trimmed(&self) -> &str {
        self.output.trim()
    }

    /// 失败诊断：有输出用输出，否则用退出码
    pub fn diagnostic(&self) -> String {
        let text = self.trimmed();
        if !text.is_empty() {
            return text.to_string();
        }
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// 外部命令执行接口
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// 在 `work_dir` 中执行 `program args...`，等待其结束
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        work_dir: &Path,
    ) -> Result<CommandOutput, CommandError>;
}

/// 基于 tokio::process 的真实实现
#[derive(Clone, Debug, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandExecutor for SystemCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        work_dir: &Path,
    ) -> Result<CommandOutput, CommandError> {
        // 参数里可能带 remote URL 凭据，只记录程序名和参数个数
        debug!(
            program,
            arg_count = args.len(),
            work_dir = %work_dir.display(),
            "Running command"
        );

        let output = Command::new(program)
            .args(args)
            .current_dir(work_dir)
            .output()
            .await
            .map_err(|source| CommandError::SpawnFailed {
                program: program.to_string(),
                source,
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            output: combined,
        })
    }
}

/// 脚本化的假执行器，按命令行子串（可选限定工作目录）匹配返回预设结果并记录调用
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::Mutex;

    type Scripted = Result<CommandOutput, String>;

    struct Rule {
        dir: Option<PathBuf>,
        pattern: String,
        responses: VecDeque<Scripted>,
    }

    impl Rule {
        fn matches(&self, work_dir: &Path, line: &str) -> bool {
            self.dir.as_deref().map_or(true, |d| d == work_dir) && line.contains(&self.pattern)
        }
    }

    #[derive(Default)]
    pub struct ScriptedExecutor {
        rules: Mutex<Vec<Rule>>,
        calls: Mutex<Vec<(PathBuf, String)>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// 命令行包含 `pattern` 时返回 `output`。同一 pattern 多次调用按 FIFO 消费，
        /// 最后一个结果会被重复使用。未匹配的命令返回成功且无输出。
        pub fn on(&self, pattern: &str, output: CommandOutput) -> &Self {
            self.push(None, pattern, Ok(output))
        }

        /// 同 `on`，但只对 `dir` 中执行的命令生效
        pub fn on_in(&self, dir: &Path, pattern: &str, output: CommandOutput) -> &Self {
            self.push(Some(dir.to_path_buf()), pattern, Ok(output))
        }

        /// 命令行包含 `pattern` 时模拟启动失败
        pub fn spawn_error(&self, pattern: &str, message: &str) -> &Self {
            self.push(None, pattern, Err(message.to_string()))
        }

        fn push(&self, dir: Option<PathBuf>, pattern: &str, response: Scripted) -> &Self {
            let mut rules = self.rules.lock().unwrap();
            match rules
                .iter_mut()
                .find(|r| r.dir == dir && r.pattern == pattern)
            {
                Some(rule) => rule.responses.push_back(response),
                None => rules.push(Rule {
                    dir,
                    pattern: pattern.to_string(),
                    responses: VecDeque::from([response]),
                }),
            }
            self
        }

        /// 所有调用过的命令行
        pub fn calls(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(_, line)| line.clone())
                .collect()
        }

        /// 命令行包含 `pattern` 的调用次数
        pub fn count(&self, pattern: &str) -> usize {
            self.calls().iter().filter(|c| c.contains(pattern)).count()
        }

        /// 在 `dir` 中执行且命令行包含 `pattern` 的调用次数
        pub fn count_in(&self, dir: &Path, pattern: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(d, line)| d == dir && line.contains(pattern))
                .count()
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn run(
            &self,
            program: &str,
            args: &[&str],
            work_dir: &Path,
        ) -> Result<CommandOutput, CommandError> {
            let line = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls
                .lock()
                .unwrap()
                .push((work_dir.to_path_buf(), line.clone()));

            let mut rules = self.rules.lock().unwrap();
            let response = rules
                .iter_mut()
                .find(|r| r.matches(work_dir, &line))
                .and_then(|rule| {
                    if rule.responses.len() > 1 {
                        rule.responses.pop_front()
                    } else {
                        rule.responses.front().cloned()
                    }
                })
                .unwrap_or_else(|| Ok(CommandOutput::ok("")));

            response.map_err(|message| CommandError::SpawnFailed {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, message),
            })
        }
    }
}
