//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::config::{parse_duration, Settings};
use crate::health::StatsMode;
use crate::report::{ColorChoice, OutputFormat};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// LiveProbe - 多协议存活与延迟探测工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "liveprobe",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 探测目标，例如 localhost:8080、https://example.com、redis://:secret@cache/0
    #[arg(value_name = "TARGETS", help = "探测目标")]
    pub targets: Vec<String>,

    /// 探测轮次
    #[arg(
        short,
        long,
        value_name = "N",
        help = "探测轮次，0 表示不限 [默认: 0]",
        env = "LIVEPROBE_COUNT"
    )]
    pub count: Option<u64>,

    /// 单次探测超时
    #[arg(
        short,
        long,
        value_name = "DURATION",
        value_parser = parse_duration,
        help = "单次探测超时 [默认: 10s]",
        env = "LIVEPROBE_TIMEOUT"
    )]
    pub timeout: Option<Duration>,

    /// 两轮之间的间隔
    #[arg(
        short,
        long,
        value_name = "DURATION",
        value_parser = parse_duration,
        help = "两轮之间的间隔 [默认: 1s]",
        env = "LIVEPROBE_INTERVAL"
    )]
    pub interval: Option<Duration>,

    /// 颜色输出
    #[arg(long, value_enum, help = "颜色输出 [默认: auto]", env = "LIVEPROBE_COLOR")]
    pub color: Option<ColorChoice>,

    /// 统计输出模式
    #[arg(
        long,
        value_enum,
        help = "统计输出模式 [默认: all]",
        env = "LIVEPROBE_STATS"
    )]
    pub stats: Option<StatsMode>,

    /// 输出格式
    #[arg(
        short = 'o',
        long,
        value_enum,
        help = "输出格式 [默认: console]",
        env = "LIVEPROBE_FORMAT"
    )]
    pub format: Option<OutputFormat>,

    /// 同一轮内并发探测所有目标
    #[arg(long, help = "同一轮内并发探测所有目标", env = "LIVEPROBE_PARALLEL")]
    pub parallel: bool,

    /// 配置文件路径
    #[arg(
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "LIVEPROBE_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "warn",
        help = "日志级别",
        env = "LIVEPROBE_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志", env = "LIVEPROBE_LOG_JSON")]
    pub log_json: bool,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

impl Args {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// 把命令行参数合并到运行设置
    ///
    /// 命令行目标追加在配置文件目标之后；显式给出的参数覆盖配置文件。
    pub fn apply_to(&self, settings: &mut Settings) {
        settings.targets.extend(self.targets.iter().cloned());

        if let Some(count) = self.count {
            settings.runner.count = count;
        }
        if let Some(timeout) = self.timeout {
            settings.runner.timeout = timeout;
        }
        if let Some(interval) = self.interval {
            settings.runner.interval = interval;
        }
        if let Some(stats) = self.stats {
            settings.runner.stats = stats;
        }
        if self.parallel {
            settings.runner.parallel = true;
        }
        if let Some(format) = self.format {
            settings.format = format;
        }
        if let Some(color) = self.color {
            settings.color = color;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;
    use serial_test::serial;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("liveprobe").chain(args.iter().copied())).unwrap()
    }

    #[test]
    #[serial]
    fn test_parse_flags() {
        let args = parse(&[
            "-c", "3", "-t", "1m30s", "-i", "250ms", "--stats", "only", "-o", "json", "--color",
            "never", "--parallel", "localhost:8080", "redis://cache",
        ]);

        assert_eq!(args.targets, vec!["localhost:8080", "redis://cache"]);
        assert_eq!(args.count, Some(3));
        assert_eq!(args.timeout, Some(Duration::from_secs(90)));
        assert_eq!(args.interval, Some(Duration::from_millis(250)));
        assert_eq!(args.stats, Some(StatsMode::Only));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.color, Some(ColorChoice::Never));
        assert!(args.parallel);
        assert_eq!(args.log_level, LogLevel::Warn);
    }

    #[test]
    #[serial]
    fn test_invalid_duration_is_rejected() {
        let result = Args::try_parse_from(["liveprobe", "-t", "forever", "localhost"]);
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_env_fallback() {
        std::env::set_var("LIVEPROBE_COUNT", "7");
        let args = parse(&["localhost"]);
        std::env::remove_var("LIVEPROBE_COUNT");

        assert_eq!(args.count, Some(7));
    }

    #[test]
    #[serial]
    fn test_cli_overrides_file() {
        let mut settings = Settings::from_file(FileConfig {
            targets: vec!["from-file".to_string()],
            count: Some(10),
            timeout: Some(Duration::from_secs(2)),
            parallel: Some(true),
            ..Default::default()
        });

        parse(&["-c", "2", "from-cli"]).apply_to(&mut settings);

        assert_eq!(settings.targets, vec!["from-file", "from-cli"]);
        assert_eq!(settings.runner.count, 2);
        assert_eq!(settings.runner.timeout, Duration::from_secs(2));
        assert!(settings.runner.parallel);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }
}
