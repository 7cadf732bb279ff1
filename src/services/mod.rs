//! 服务模块
//!
//! 部署周期：源码跟踪 → 构建安装 → 通知，由调度器循环驱动

pub mod pipeline;
pub mod reconciler;
pub mod scheduler;
pub mod source;

pub use pipeline::BuildPipeline;
pub use reconciler::{EnvironmentReconciler, Reconciler};
pub use scheduler::{CycleSummary, IntervalTicker, Scheduler, Ticker};
pub use source::SourceTracker;
