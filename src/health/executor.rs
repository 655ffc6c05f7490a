//! 有界执行
//!
//! 把一次探测放进独立任务，与截止时间赛跑，先到者决定结果

use crate::error::ProbeError;
use crate::health::result::Outcome;
use crate::probe::{Probe, ProbeContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

/// 在给定时长内执行一次探测
///
/// 耗时从进入本函数开始计算，无论哪个分支胜出都会返回。
/// 两个信号同时就绪时超时优先；超时后探测任务被中止。
///
/// # 参数
/// * `probe` - 探测器
/// * `timeout` - 本次探测的时长上限
///
/// # 返回
/// * `(Duration, Outcome)` - 耗时与分类结果
pub async fn execute(probe: Arc<dyn Probe>, timeout: Duration) -> (Duration, Outcome) {
    let start = Instant::now();
    let deadline = start + timeout;
    let ctx = ProbeContext::with_deadline(deadline, timeout);

    let mut handle = tokio::spawn(async move { probe.ping(&ctx).await });

    let outcome = tokio::select! {
        biased;

        _ = sleep_until(deadline) => {
            handle.abort();
            Outcome::Timeout(ProbeError::Timeout(timeout))
        }
        joined = &mut handle => classify(joined),
    };

    let elapsed = start.elapsed();
    debug!("探测完成: {} 耗时 {:?}", outcome.status(), elapsed);
    (elapsed, outcome)
}

/// 把任务的返回值归类为探测结果
fn classify(joined: Result<Result<(), ProbeError>, JoinError>) -> Outcome {
    match joined {
        Ok(result) => Outcome::from_result(result),
        Err(e) if e.is_panic() => {
            warn!("探测任务发生panic: {}", e);
            Outcome::Error(ProbeError::Internal(e.to_string()))
        }
        Err(e) => Outcome::Error(ProbeError::Internal(e.to_string())),
    }
}
