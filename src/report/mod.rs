//! 结果输出模块
//!
//! 定义运行器的输出回调接口，并提供控制台和JSON两种实现

pub mod console;
pub mod json;

use crate::error::ProbeError;
use crate::health::{Status, TargetStats};
use clap::ValueEnum;
use serde::Deserialize;
use std::io::Write;
use std::time::Duration;

pub use console::ConsoleReporter;
pub use json::JsonReporter;

/// 运行器的输出回调
///
/// 回调只用于展示，不能影响探测流程；写入失败由实现自行处理。
pub trait Reporter: Send {
    /// 即将探测某个目标
    fn on_probe_start(&mut self, target: &str);

    /// 某个目标的一次探测已结束
    ///
    /// # 参数
    /// * `target` - 目标名称
    /// * `status` - 探测状态
    /// * `elapsed` - 耗时
    /// * `cause` - 失败或超时的原因
    fn on_probe_result(
        &mut self,
        target: &str,
        status: Status,
        elapsed: Duration,
        cause: Option<&ProbeError>,
    );

    /// 即将输出统计信息
    fn on_stats_start(&mut self);

    /// 输出单个目标的统计信息
    fn on_stats(&mut self, stats: &TargetStats);
}

/// 输出格式
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 人类可读的控制台输出
    #[default]
    Console,
    /// 每行一条JSON记录
    Json,
}

/// 颜色输出选项
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// 输出到终端且未设置 `NO_COLOR` 时启用
    #[default]
    Auto,
    /// 总是启用
    Always,
    /// 总是禁用
    Never,
}

impl ColorChoice {
    /// 决定是否启用颜色
    ///
    /// # 参数
    /// * `is_terminal` - 标准输出是否为终端
    /// * `no_color` - 是否设置了 `NO_COLOR` 环境变量
    pub fn enabled(self, is_terminal: bool, no_color: bool) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => is_terminal && !no_color,
        }
    }
}

/// 根据输出格式创建回调
///
/// # 参数
/// * `format` - 输出格式
/// * `targets` - 全部目标名称，用于控制台对齐
/// * `color` - 是否启用颜色（仅控制台输出使用）
/// * `writer` - 输出目标
pub fn build_reporter<W>(
    format: OutputFormat,
    targets: &[String],
    color: bool,
    writer: W,
) -> Box<dyn Reporter>
where
    W: Write + Send + 'static,
{
    match format {
        OutputFormat::Console => Box::new(ConsoleReporter::new(writer, targets, color)),
        OutputFormat::Json => Box::new(JsonReporter::new(writer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_choice() {
        assert!(ColorChoice::Always.enabled(false, true));
        assert!(!ColorChoice::Never.enabled(true, false));
        assert!(ColorChoice::Auto.enabled(true, false));
        assert!(!ColorChoice::Auto.enabled(true, true));
        assert!(!ColorChoice::Auto.enabled(false, false));
    }

    #[test]
    fn test_format_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: OutputFormat,
            color: ColorChoice,
        }

        let parsed: Wrapper = toml::from_str("format = \"json\"\ncolor = \"never\"").unwrap();
        assert_eq!(parsed.format, OutputFormat::Json);
        assert_eq!(parsed.color, ColorChoice::Never);
    }
}
