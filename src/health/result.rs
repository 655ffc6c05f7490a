//! 探测结果数据结构
//!
//! 定义探测状态、单次结果以及按目标汇总的统计信息

use crate::error::ProbeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 探测状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// 探测成功
    Ok,
    /// 截止时间内未完成
    Timeout,
    /// 探测失败
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Ok => write!(f, "ok"),
            Status::Timeout => write!(f, "timeout"),
            Status::Error => write!(f, "error"),
        }
    }
}

/// 单次探测的分类结果
///
/// 超时和错误始终区分，不会合并。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 探测成功
    Ok,
    /// 超时，携带截止时间到期的原因
    Timeout(ProbeError),
    /// 探测失败，携带失败原因
    Error(ProbeError),
}

impl Outcome {
    /// 对应的状态
    pub fn status(&self) -> Status {
        match self {
            Outcome::Ok => Status::Ok,
            Outcome::Timeout(_) => Status::Timeout,
            Outcome::Error(_) => Status::Error,
        }
    }

    /// 失败或超时的原因
    pub fn cause(&self) -> Option<&ProbeError> {
        match self {
            Outcome::Ok => None,
            Outcome::Timeout(cause) | Outcome::Error(cause) => Some(cause),
        }
    }

    /// 根据探测器返回值分类
    ///
    /// 探测器自身因共享截止时间而返回的超时错误同样归为超时。
    pub fn from_result(result: Result<(), ProbeError>) -> Self {
        match result {
            Ok(()) => Outcome::Ok,
            Err(e) if e.is_timeout() => Outcome::Timeout(e),
            Err(e) => Outcome::Error(e),
        }
    }
}

/// 历史记录中的一次采样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// 状态
    pub status: Status,
    /// 耗时
    pub elapsed: Duration,
}

impl Sample {
    /// 创建新的采样
    pub fn new(status: Status, elapsed: Duration) -> Self {
        Self { status, elapsed }
    }
}

/// 单个目标的统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStats {
    /// 目标（用户输入的原始字符串）
    pub target: String,
    /// 成功次数
    pub ok: usize,
    /// 超时次数
    pub timeout: usize,
    /// 失败次数
    pub error: usize,
    /// 总次数
    pub total: usize,
    /// 最小耗时
    pub min: Duration,
    /// 最大耗时
    pub max: Duration,
    /// 平均耗时
    pub average: Duration,
}

impl TargetStats {
    /// 从历史记录计算统计信息
    ///
    /// 历史为空时返回 `None`。平均值按 `average += elapsed / total`
    /// 逐个累加，每次除法在纳秒精度上截断，因此可能比精确平均值
    /// 略小（最多 `total - 1` 纳秒）。
    ///
    /// # 参数
    /// * `target` - 目标名称
    /// * `history` - 按时间顺序排列的采样
    pub fn from_history(target: &str, history: &[Sample]) -> Option<Self> {
        if history.is_empty() {
            return None;
        }

        let total = history.len();
        let divisor = u32::try_from(total).unwrap_or(u32::MAX);
        let mut stats = Self {
            target: target.to_string(),
            ok: 0,
            timeout: 0,
            error: 0,
            total,
            min: Duration::MAX,
            max: Duration::ZERO,
            average: Duration::ZERO,
        };

        for sample in history {
            match sample.status {
                Status::Ok => stats.ok += 1,
                Status::Timeout => stats.timeout += 1,
                Status::Error => stats.error += 1,
            }

            stats.min = stats.min.min(sample.elapsed);
            stats.max = stats.max.max(sample.elapsed);
            stats.average += sample.elapsed / divisor;
        }

        Some(stats)
    }

    /// 是否全部成功
    pub fn all_ok(&self) -> bool {
        self.ok == self.total
    }
}
