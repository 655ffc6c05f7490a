//! JSON输出
//!
//! 每行一条记录，耗时以整数纳秒表示：
//! `{"type":"ping","payload":{...}}` 或 `{"type":"stats","payload":{...}}`

use crate::error::ProbeError;
use crate::health::{Status, TargetStats};
use crate::report::Reporter;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::debug;

/// 单次探测记录
#[derive(Debug, Serialize)]
pub struct PingRecord<'a> {
    pub target: &'a str,
    pub status: Status,
    #[serde(with = "duration_nanos")]
    pub elapsed: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// 统计记录
#[derive(Debug, Serialize)]
pub struct StatsRecord<'a> {
    pub target: &'a str,
    pub ok: usize,
    pub timeout: usize,
    pub error: usize,
    pub total: usize,
    #[serde(with = "duration_nanos")]
    pub min: Duration,
    #[serde(with = "duration_nanos")]
    pub max: Duration,
    #[serde(with = "duration_nanos")]
    pub average: Duration,
}

/// 输出记录
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "lowercase")]
pub enum Record<'a> {
    Ping(PingRecord<'a>),
    Stats(StatsRecord<'a>),
}

impl<'a> From<&'a TargetStats> for StatsRecord<'a> {
    fn from(stats: &'a TargetStats) -> Self {
        Self {
            target: &stats.target,
            ok: stats.ok,
            timeout: stats.timeout,
            error: stats.error,
            total: stats.total,
            min: stats.min,
            max: stats.max,
            average: stats.average,
        }
    }
}

/// 耗时按整数纳秒序列化
mod duration_nanos {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }
}

/// JSON输出
pub struct JsonReporter<W> {
    writer: W,
}

impl<W: Write + Send> JsonReporter<W> {
    /// 创建JSON输出
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 取回输出目标
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, record: &Record<'_>) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn emit(&mut self, record: Record<'_>) {
        if let Err(e) = self.write_record(&record) {
            debug!("写入JSON记录失败: {}", e);
        }
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn on_probe_start(&mut self, _target: &str) {}

    fn on_probe_result(
        &mut self,
        target: &str,
        status: Status,
        elapsed: Duration,
        cause: Option<&ProbeError>,
    ) {
        self.emit(Record::Ping(PingRecord {
            target,
            status,
            elapsed,
            err: cause.map(ToString::to_string),
        }));
    }

    fn on_stats_start(&mut self) {}

    fn on_stats(&mut self, stats: &TargetStats) {
        self.emit(Record::Stats(StatsRecord::from(stats)));
    }
}
