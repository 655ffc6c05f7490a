//! LiveProbe 主程序入口
//!
//! 多协议存活与延迟探测工具

use anyhow::{Context, Result};
use clap::Parser;
use liveprobe::app;
use liveprobe::cli::Args;
use liveprobe::logging::{LogConfig, LoggingSystem};
use std::io::IsTerminal;
use tokio::signal;
use tracing::{debug, error, info, warn};

/// 被 Ctrl-C 中断时的退出码
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 日志写入标准错误，标准输出只留给探测结果
    let log_config = LogConfig {
        level: args.log_level.into(),
        json_format: args.log_json,
        ansi: std::io::stderr().is_terminal(),
    };
    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!("LiveProbe v{} 启动", liveprobe::VERSION);

    let mut runner = match app::prepare(&args).await {
        Ok(runner) => runner,
        Err(e) => {
            error!("启动失败: {}", e);
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = runner.run() => {
            let stats = result.context("探测运行失败")?;
            debug!("探测完成，共 {} 个目标有统计", stats.len());
        }
        _ = shutdown_signal() => {
            info!("收到中断信号，停止探测");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }

    Ok(())
}

/// 等待 Ctrl-C；无法注册信号处理时永不返回
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("注册中断信号处理失败: {}", e);
        std::future::pending::<()>().await;
    }
}
