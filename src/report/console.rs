//! 控制台输出
//!
//! 目标名右对齐到最长目标，状态着色，失败原因缩进显示在下一行

use crate::error::ProbeError;
use crate::health::{Status, TargetStats};
use crate::report::Reporter;
use colored::Colorize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;

/// 文本样式
#[derive(Debug, Clone, Copy)]
enum Style {
    Target,
    Arrow,
    Ok,
    Timeout,
    Error,
    Elapsed,
}

impl Style {
    fn paint(self, text: &str, enabled: bool) -> String {
        if !enabled {
            return text.to_string();
        }

        match self {
            Style::Target => text.bright_white().to_string(),
            Style::Arrow => text.black().to_string(),
            Style::Ok => text.green().to_string(),
            Style::Timeout => text.yellow().to_string(),
            Style::Error => text.bright_red().to_string(),
            Style::Elapsed => text.bright_black().to_string(),
        }
    }

    fn for_status(status: Status) -> Self {
        match status {
            Status::Ok => Style::Ok,
            Status::Timeout => Style::Timeout,
            Status::Error => Style::Error,
        }
    }

    /// 统计行的颜色：全部成功为绿色，超时多于错误为黄色，否则为红色
    fn for_stats(stats: &TargetStats) -> Self {
        if stats.all_ok() {
            Style::Ok
        } else if stats.timeout > stats.error {
            Style::Timeout
        } else {
            Style::Error
        }
    }
}

/// 控制台输出
pub struct ConsoleReporter<W> {
    writer: W,
    width: usize,
    color: bool,
    /// 已输出前缀、等待结果的目标
    open_line: Option<String>,
}

impl<W: Write + Send> ConsoleReporter<W> {
    /// 创建控制台输出
    ///
    /// # 参数
    /// * `writer` - 输出目标
    /// * `targets` - 全部目标名称，用于计算对齐宽度
    /// * `color` - 是否启用颜色
    pub fn new(writer: W, targets: &[String], color: bool) -> Self {
        let width = targets
            .iter()
            .map(|t| t.chars().count())
            .max()
            .unwrap_or(0);

        Self {
            writer,
            width,
            color,
            open_line: None,
        }
    }

    /// 取回输出目标
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn target(&self, target: &str) -> String {
        Style::Target.paint(&format!("{:>width$}", target, width = self.width), self.color)
    }

    fn write_prefix(&mut self, target: &str) -> io::Result<()> {
        let line = format!(
            "{} {} ",
            self.target(target),
            Style::Arrow.paint("->", self.color)
        );
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }

    fn write_result(
        &mut self,
        target: &str,
        status: Status,
        elapsed: Duration,
        cause: Option<&ProbeError>,
    ) -> io::Result<()> {
        // 并发模式下同一时刻只有一个前缀留在屏幕上
        if self.open_line.as_deref() == Some(target) {
            self.open_line = None;
        } else {
            self.write_prefix(target)?;
        }

        let status_text = format!("{:<7}", status.to_string());
        let mut line = format!(
            "{} {}\n",
            Style::for_status(status).paint(&status_text, self.color),
            Style::Elapsed.paint(&format!("{elapsed:?}"), self.color)
        );
        if status == Status::Error {
            if let Some(cause) = cause {
                line.push_str(&format!("  {cause}\n"));
            }
        }

        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }

    fn write_stats(&mut self, stats: &TargetStats) -> io::Result<()> {
        let counts = format!(
            "ok/timeout/error/total = {:2}/{:2}/{:2}/{:2}",
            stats.ok, stats.timeout, stats.error, stats.total
        );
        let line = format!(
            "{}: {}, min/max/average = {:>12}/{:>12}/{:>12}\n",
            self.target(&stats.target),
            Style::for_stats(stats).paint(&counts, self.color),
            format!("{:?}", stats.min),
            format!("{:?}", stats.max),
            format!("{:?}", stats.average)
        );

        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn on_probe_start(&mut self, target: &str) {
        if self.open_line.is_some() {
            return;
        }
        match self.write_prefix(target) {
            Ok(()) => self.open_line = Some(target.to_string()),
            Err(e) => debug!("写入控制台失败: {}", e),
        }
    }

    fn on_probe_result(
        &mut self,
        target: &str,
        status: Status,
        elapsed: Duration,
        cause: Option<&ProbeError>,
    ) {
        if let Err(e) = self.write_result(target, status, elapsed, cause) {
            debug!("写入控制台失败: {}", e);
        }
    }

    fn on_stats_start(&mut self) {
        if let Err(e) = writeln!(self.writer) {
            debug!("写入控制台失败: {}", e);
        }
    }

    fn on_stats(&mut self, stats: &TargetStats) {
        if let Err(e) = self.write_stats(stats) {
            debug!("写入控制台失败: {}", e);
        }
    }
}
