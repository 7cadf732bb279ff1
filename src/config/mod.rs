//! 配置模块
//!
//! 配置文件解析与环境变量覆盖

pub mod env;
pub mod settings;

pub use settings::{AgentConfig, BuildConfig, NotifyConfig};
