//! 部署目标与仓库凭据

use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// 部署环境：一个分支 + 一个本地工作副本 + 一个 systemd 服务
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Environment {
    /// 目标分支
    pub branch: String,
    /// 本地仓库工作目录
    pub dir: PathBuf,
    /// 服务名称（同时决定安装后的二进制文件名）
    pub service_name: String,
}

impl Environment {
    pub fn new(branch: impl Into<String>, dir: impl Into<PathBuf>, service_name: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            dir: dir.into(),
            service_name: service_name.into(),
        }
    }
}

/// 仓库凭据，所有环境共享
#[derive(Clone, Deserialize, PartialEq, Eq, Default)]
pub struct RepositoryCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub token: String,
    pub repo_owner: String,
    pub repo_name: String,
    #[serde(default)]
    pub use_auth: bool,
    /// Git 托管域名
    #[serde(default = "default_git_host")]
    pub host: String,
}

fn default_git_host() -> String {
    "github.com".to_string()
}

impl RepositoryCredentials {
    /// 构造 remote URL
    ///
    /// `use_auth` 为 true 时把用户名和 token（百分号编码后）嵌入 URL，否则返回不带凭据的 URL。
    pub fn remote_url(&self) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&format!(
            "https://{}/{}/{}.git",
            self.host, self.repo_owner, self.repo_name
        ))?;

        if self.use_auth {
            // 只有没有 host 的 URL 会拒绝 userinfo，上面的 parse 已经排除
            url.set_username(&self.username)
                .and_then(|_| url.set_password(Some(&self.token)))
                .map_err(|_| url::ParseError::EmptyHost)?;
        }

        Ok(url.to_string())
    }

    /// 从诊断文本中抹掉 token（原文和 URL 编码后的形式）
    pub fn redact(&self, text: &str) -> String {
        if self.token.is_empty() {
            return text.to_string();
        }

        let mut redacted = text.replace(&self.token, "***");
        if let Some(encoded) = self.encoded_token() {
            if encoded != self.token {
                redacted = redacted.replace(&encoded, "***");
            }
        }
        redacted
    }

    /// token 出现在 URL userinfo 中的形式
    fn encoded_token(&self) -> Option<String> {
        let mut url = Url::parse("https://redact.invalid/").ok()?;
        url.set_password(Some(&self.token)).ok()?;
        url.password().map(str::to_string)
    }
}

// token 不能出现在 Debug 输出里
impl std::fmt::Debug for RepositoryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryCredentials")
            .field("username", &self.username)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("repo_owner", &self.repo_owner)
            .field("repo_name", &self.repo_name)
            .field("use_auth", &self.use_auth)
            .field("host", &self.host)
            .finish()
    }
}
