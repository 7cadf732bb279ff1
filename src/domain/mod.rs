//! 领域模型
//!
//! 与外部工具无关的纯数据类型

pub mod deploy;
pub mod environment;

pub use deploy::{short_hash, DeployOutcome, DeployReport, DeployStage, StageStatus};
pub use environment::{Environment, RepositoryCredentials};
