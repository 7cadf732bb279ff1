//! 配置文件加载
//!
//! 启动时从 JSON 文件读取一次，之后只读，通过参数显式传递。

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::config::env;
use crate::domain::{Environment, RepositoryCredentials};
use crate::error::ConfigError;

/// Agent 配置
#[derive(Clone, Debug, Deserialize)]
pub struct AgentConfig {
    /// 按配置顺序逐个处理的部署环境
    pub environments: Vec<Environment>,
    /// 日志文件路径（追加写入）
    pub log_file: PathBuf,
    /// 轮询间隔（秒）
    #[serde(rename = "interval_seconds")]
    pub interval_secs: u64,
    /// 仓库凭据
    #[serde(rename = "git_config")]
    pub git: RepositoryCredentials,
    /// Slack webhook 通知
    #[serde(default, rename = "slack")]
    pub notify: NotifyConfig,
    /// 构建与安装参数
    #[serde(default)]
    pub build: BuildConfig,
}

/// 通知配置
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub webhook_url: String,
}

impl NotifyConfig {
    /// 启用且配置了 URL 时才真正发送
    pub fn is_active(&self) -> bool {
        self.enabled && !self.webhook_url.trim().is_empty()
    }
}

/// 构建、安装、重启使用的外部工具
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// 构建工具（如 `go`）
    pub toolchain: String,
    /// 构建参数，`{output}` 和 `{source}` 会被替换为绝对路径
    pub build_args: Vec<String>,
    /// 源码子目录（相对于工作目录）
    pub source_subpath: String,
    /// 产物文件名（位于工作目录下）
    pub artifact_name: String,
    /// 安装目录，安装后的文件名为服务名
    pub install_dir: PathBuf,
    /// 提权命令
    pub privilege_command: String,
    /// 服务管理器
    pub service_manager: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            toolchain: "go".to_string(),
            build_args: vec![
                "build".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
                "{source}".to_string(),
            ],
            source_subpath: "cmd".to_string(),
            artifact_name: "notify-hub".to_string(),
            install_dir: PathBuf::from("/usr/local/bin"),
            privilege_command: "sudo".to_string(),
            service_manager: "systemctl".to_string(),
        }
    }
}

impl AgentConfig {
    /// 读取、解析、应用环境变量覆盖并校验
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        env::apply_overrides(&mut config, |key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "interval_seconds must be at least 1".to_string(),
            ));
        }

        if self.git.repo_owner.trim().is_empty() || self.git.repo_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "git_config.repo_owner and git_config.repo_name are required".to_string(),
            ));
        }

        if let Err(e) = self.git.remote_url() {
            return Err(ConfigError::Invalid(format!(
                "git_config does not form a valid remote URL: {}",
                e
            )));
        }

        if self.git.use_auth && (self.git.username.is_empty() || self.git.token.is_empty()) {
            return Err(ConfigError::Invalid(
                "git_config.use_auth requires username and token".to_string(),
            ));
        }

        for (i, env) in self.environments.iter().enumerate() {
            if env.branch.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "environments[{}].branch is empty",
                    i
                )));
            }
            if env.dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "environments[{}].dir is empty",
                    i
                )));
            }
            if env.service_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "environments[{}].service_name is empty",
                    i
                )));
            }
        }

        if self.build.toolchain.trim().is_empty() {
            return Err(ConfigError::Invalid("build.toolchain is empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "environments": [
            {"branch": "main", "dir": "/srv/prod", "service_name": "notify-hub"},
            {"branch": "develop", "dir": "/srv/dev", "service_name": "notify-hub-dev"}
        ],
        "log_file": "/var/log/deploy-agent.log",
        "interval_seconds": 60,
        "git_config": {
            "username": "deployer",
            "token": "ghp_secret",
            "repo_owner": "acme",
            "repo_name": "notify-hub",
            "use_auth": true
        },
        "slack": {"enabled": true, "webhook_url": "https://hooks.slack.com/services/x"}
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = AgentConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.environments.len(), 2);
        assert_eq!(config.environments[1].branch, "develop");
        assert_eq!(config.interval_secs, 60);
        assert!(config.git.use_auth);
        assert_eq!(config.git.host, "github.com");
        assert!(config.notify.is_active());
        assert_eq!(config.build.toolchain, "go");
        assert_eq!(config.build.install_dir, PathBuf::from("/usr/local/bin"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_notify_defaults_to_disabled() {
        let raw = r#"{
            "environments": [],
            "log_file": "agent.log",
            "interval_seconds": 5,
            "git_config": {"repo_owner": "acme", "repo_name": "app"}
        }"#;
        let config = AgentConfig::from_json(raw).unwrap();
        assert!(!config.notify.is_active());
        assert!(!config.git.use_auth);
    }

    #[test]
    fn test_notify_enabled_without_url_is_inactive() {
        let notify = NotifyConfig {
            enabled: true,
            webhook_url: "  ".to_string(),
        };
        assert!(!notify.is_active());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = AgentConfig::from_json(SAMPLE).unwrap();
        config.interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_auth_without_token() {
        let mut config = AgentConfig::from_json(SAMPLE).unwrap();
        config.git.token.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_git_host() {
        let mut config = AgentConfig::from_json(SAMPLE).unwrap();
        config.git.host = "git hub.com".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("valid remote URL"));
    }

    #[test]
    fn test_validate_rejects_empty_service_name() {
        let mut config = AgentConfig::from_json(SAMPLE).unwrap();
        config.environments[0].service_name = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("environments[0].service_name"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AgentConfig::load(file.path()).unwrap();
        assert_eq!(config.environments[0].service_name, "notify-hub");
    }

    #[test]
    fn test_load_missing_file() {
        let err = AgentConfig::load(Path::new("/nonexistent/deploy-agent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = AgentConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
