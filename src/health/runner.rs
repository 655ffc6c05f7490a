//! 迭代运行器
//!
//! 按轮次对所有目标执行有界探测，记录历史并在结束后汇总统计，
//! 各阶段通过 [`Reporter`] 回调通知输出层

use crate::error::RunnerError;
use crate::health::executor::execute;
use crate::health::result::{Outcome, Sample, TargetStats};
use crate::probe::Probe;
use crate::report::Reporter;
use clap::ValueEnum;
use futures::future::join_all;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 统计输出模式
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsMode {
    /// 输出每次探测结果和最终统计
    #[default]
    All,
    /// 只输出最终统计
    Only,
    /// 只输出每次探测结果
    None,
}

impl StatsMode {
    /// 是否输出单次探测结果
    pub fn reports_probes(self) -> bool {
        self != StatsMode::Only
    }

    /// 是否输出统计信息
    pub fn reports_stats(self) -> bool {
        self != StatsMode::None
    }
}

impl std::fmt::Display for StatsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsMode::All => write!(f, "all"),
            StatsMode::Only => write!(f, "only"),
            StatsMode::None => write!(f, "none"),
        }
    }
}

/// 运行器配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// 轮次，0 表示不限
    pub count: u64,
    /// 两轮之间的间隔
    pub interval: Duration,
    /// 单次探测的时长上限
    pub timeout: Duration,
    /// 统计输出模式
    pub stats: StatsMode,
    /// 同一轮内是否并发探测所有目标
    pub parallel: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            count: 0,
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
            stats: StatsMode::All,
            parallel: false,
        }
    }
}

/// 运行器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// 尚未运行
    Idle,
    /// 运行中
    Running,
    /// 已结束
    Done,
}

/// 探测目标
struct Entry {
    name: String,
    probe: Arc<dyn Probe>,
}

/// 迭代运行器
pub struct Runner {
    config: RunnerConfig,
    reporter: Box<dyn Reporter>,
    entries: Vec<Entry>,
    state: RunnerState,
}

impl Runner {
    /// 创建新的运行器
    ///
    /// # 参数
    /// * `config` - 运行器配置
    /// * `reporter` - 结果输出回调
    pub fn new(config: RunnerConfig, reporter: Box<dyn Reporter>) -> Self {
        Self {
            config,
            reporter,
            entries: Vec::new(),
            state: RunnerState::Idle,
        }
    }

    /// 添加探测目标，按添加顺序探测和输出
    ///
    /// # 参数
    /// * `name` - 目标名称（用户输入的原始字符串）
    /// * `probe` - 探测器
    pub fn add_target(&mut self, name: impl Into<String>, probe: Arc<dyn Probe>) {
        self.entries.push(Entry {
            name: name.into(),
            probe,
        });
    }

    /// 当前状态
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// 配置
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// 目标数量
    pub fn target_count(&self) -> usize {
        self.entries.len()
    }

    /// 执行全部轮次并返回统计信息
    ///
    /// 每个运行器只能运行一次。轮次为 0 时一直运行，直到调用方放弃该 future。
    pub async fn run(&mut self) -> Result<Vec<TargetStats>, RunnerError> {
        if self.state != RunnerState::Idle {
            return Err(RunnerError::AlreadyStarted);
        }
        self.state = RunnerState::Running;

        info!(
            "开始探测 {} 个目标，轮次: {}，间隔: {:?}，超时: {:?}",
            self.entries.len(),
            self.config.count,
            self.config.interval,
            self.config.timeout
        );

        let mut histories: Vec<Vec<Sample>> = vec![Vec::new(); self.entries.len()];
        let mut iteration: u64 = 0;

        while self.config.count == 0 || iteration < self.config.count {
            if iteration > 0 {
                tokio::time::sleep(self.config.interval).await;
            }
            debug!("第 {} 轮探测", iteration + 1);

            if self.config.parallel {
                self.run_parallel(&mut histories).await;
            } else {
                self.run_sequential(&mut histories).await;
            }

            iteration += 1;
        }

        let stats = self.report_stats(&histories);
        self.state = RunnerState::Done;
        info!("探测结束，共 {} 轮", iteration);

        Ok(stats)
    }

    /// 按输入顺序逐个探测
    async fn run_sequential(&mut self, histories: &mut [Vec<Sample>]) {
        let mode = self.config.stats;

        for (entry, history) in self.entries.iter().zip(histories.iter_mut()) {
            if mode.reports_probes() {
                self.reporter.on_probe_start(&entry.name);
            }

            let (elapsed, outcome) = execute(Arc::clone(&entry.probe), self.config.timeout).await;
            Self::record(self.reporter.as_mut(), mode, &entry.name, elapsed, &outcome, history);
        }
    }

    /// 同时发起本轮全部探测，结果仍按输入顺序输出
    async fn run_parallel(&mut self, histories: &mut [Vec<Sample>]) {
        let mode = self.config.stats;

        if mode.reports_probes() {
            for entry in &self.entries {
                self.reporter.on_probe_start(&entry.name);
            }
        }

        let timeout = self.config.timeout;
        let results = join_all(
            self.entries
                .iter()
                .map(|entry| execute(Arc::clone(&entry.probe), timeout)),
        )
        .await;

        for ((entry, history), (elapsed, outcome)) in self
            .entries
            .iter()
            .zip(histories.iter_mut())
            .zip(results)
        {
            Self::record(self.reporter.as_mut(), mode, &entry.name, elapsed, &outcome, history);
        }
    }

    fn record(
        reporter: &mut dyn Reporter,
        mode: StatsMode,
        name: &str,
        elapsed: Duration,
        outcome: &Outcome,
        history: &mut Vec<Sample>,
    ) {
        let status = outcome.status();
        debug!("{} -> {} {:?}", name, status, elapsed);

        if mode.reports_probes() {
            reporter.on_probe_result(name, status, elapsed, outcome.cause());
        }
        history.push(Sample::new(status, elapsed));
    }

    /// 汇总统计并按模式输出
    fn report_stats(&mut self, histories: &[Vec<Sample>]) -> Vec<TargetStats> {
        let mode = self.config.stats;

        if mode == StatsMode::All {
            self.reporter.on_stats_start();
        }

        let mut all_stats = Vec::with_capacity(self.entries.len());
        for (entry, history) in self.entries.iter().zip(histories) {
            if let Some(stats) = TargetStats::from_history(&entry.name, history) {
                if mode.reports_stats() {
                    self.reporter.on_stats(&stats);
                }
                all_stats.push(stats);
            }
        }

        all_stats
    }
}
