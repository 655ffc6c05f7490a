//! LiveProbe - 多协议存活与延迟探测工具
//!
//! 按固定间隔对一组目标进行有界探测，支持：
//! - HTTP/HTTPS、TCP、WebSocket
//! - MySQL、PostgreSQL、Redis、AMQP
//! - 控制台和JSON两种输出
//! - 按目标汇总成功/超时/失败次数与耗时统计

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod probe;
pub mod report;
pub mod target;

// 重新导出主要类型
pub use error::LiveProbeError;
pub use health::{execute, Outcome, Runner, RunnerConfig, StatsMode, Status, TargetStats};
pub use probe::{Probe, ProbeContext, Prober};
pub use target::{resolve, Target};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
