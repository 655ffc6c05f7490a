//! 探测执行模块
//!
//! 提供有界执行、迭代运行和统计汇总功能

pub mod executor;
pub mod result;
pub mod runner;

// 重新导出主要类型
pub use executor::execute;
pub use result::{Outcome, Sample, Status, TargetStats};
pub use runner::{Runner, RunnerConfig, RunnerState, StatsMode};
