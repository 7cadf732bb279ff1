//! 基础设施模块
//!
//! 封装外部依赖（命令执行、HTTP webhook）

pub mod command;
pub mod webhook;

pub use command::{CommandExecutor, CommandOutput, SystemCommandRunner};
pub use webhook::{Notifier, WebhookNotifier};
