//! 日志系统模块
//!
//! 提供结构化日志配置和管理功能。日志始终写入标准错误，
//! 标准输出只留给探测结果。

use log::LevelFilter;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    /// 是否已初始化
    initialized: bool,
    /// 初始化结果
    init_result: Option<Result<(), String>>,
    /// 当前配置
    current_config: Option<LogConfig>,
}

/// 全局日志状态管理器
static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

fn global_state() -> MutexGuard<'static, GlobalLoggingState> {
    GLOBAL_LOGGING_STATE
        .get_or_init(|| Mutex::new(GlobalLoggingState::default()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// 日志配置结构
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// 日志级别，`RUST_LOG` 未设置时生效
    pub level: LevelFilter,
    /// 是否使用JSON格式
    pub json_format: bool,
    /// 是否输出ANSI颜色
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Warn,
            json_format: false,
            ansi: false,
        }
    }
}

/// 日志系统管理器
#[derive(Debug)]
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// 进程内只会真正初始化一次，之后的调用直接返回。
    ///
    /// # 参数
    /// * `config` - 日志配置
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        Self::setup_logging_with_options(config, false)
    }

    /// 初始化日志系统（带选项）
    ///
    /// # 参数
    /// * `config` - 日志配置
    /// * `force_reinit` - 是否强制重新初始化（主要用于测试）
    pub fn setup_logging_with_options(
        config: LogConfig,
        force_reinit: bool,
    ) -> anyhow::Result<Self> {
        {
            let state = global_state();
            if state.initialized && !force_reinit {
                if let Some(Err(e)) = &state.init_result {
                    return Err(anyhow::anyhow!("日志系统之前初始化失败: {}", e));
                }
                return Ok(Self { config });
            }
        }

        let init_result = Self::perform_initialization(&config);

        {
            let mut state = global_state();
            state.initialized = true;
            state.current_config = Some(config.clone());
            state.init_result = Some(init_result.as_ref().map(|_| ()).map_err(|e| e.to_string()));
        }

        init_result?;
        Ok(Self { config })
    }

    /// 本实例使用的配置
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn perform_initialization(config: &LogConfig) -> anyhow::Result<()> {
        // client 库通过 log 输出的记录桥接到 tracing
        Self::init_log_tracer()?;
        Self::init_tracing_subscriber(config)
    }

    fn init_log_tracer() -> anyhow::Result<()> {
        use tracing_log::LogTracer;

        static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

        let result = LOG_TRACER_INIT.get_or_init(|| LogTracer::init().map_err(|e| e.to_string()));

        result
            .as_ref()
            .map_err(|e| anyhow::anyhow!("LogTracer初始化失败: {}", e))?;
        Ok(())
    }

    fn init_tracing_subscriber(config: &LogConfig) -> anyhow::Result<()> {
        let env_filter = EnvFilter::builder()
            .with_default_directive(Self::convert_level_to_directive(config.level))
            .from_env_lossy();

        let fmt_layer = if config.json_format {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_timer(fmt::time::ChronoUtc::rfc_3339())
                .with_ansi(config.ansi)
                .with_target(true)
                .boxed()
        };

        match registry().with(env_filter).with(fmt_layer).try_init() {
            Ok(()) => {
                tracing::debug!("日志系统初始化完成: {:?}", config);
                Ok(())
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("a global default trace dispatcher has already been set")
                    || error_msg.contains(
                        "attempted to set a logger after the logging system was already initialized",
                    )
                {
                    // 测试中多次初始化属于预期情况
                    tracing::debug!("日志系统已经初始化过了");
                    Ok(())
                } else {
                    Err(anyhow::anyhow!(
                        "tracing subscriber初始化失败: {}",
                        error_msg
                    ))
                }
            }
        }
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> Directive {
        let level = match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        };
        Directive::from(level)
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE.get().is_some() && global_state().initialized
    }

    /// 获取当前日志配置（如果已初始化）
    pub fn current_config() -> Option<LogConfig> {
        GLOBAL_LOGGING_STATE.get()?;
        global_state().current_config.clone()
    }

    /// 重置日志系统状态（主要用于测试）
    #[cfg(test)]
    pub fn reset_for_testing() {
        if GLOBAL_LOGGING_STATE.get().is_some() {
            let mut state = global_state();
            state.initialized = false;
            state.init_result = None;
            state.current_config = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn create_test_config() -> LogConfig {
        LogConfig {
            level: LevelFilter::Info,
            json_format: false,
            ansi: false,
        }
    }

    #[test]
    #[serial]
    fn test_logging_system_single_initialization() {
        LoggingSystem::reset_for_testing();

        let config = create_test_config();
        assert!(LoggingSystem::setup_logging(config.clone()).is_ok());
        assert!(LoggingSystem::is_initialized());

        // 第二次调用不会重复初始化
        assert!(LoggingSystem::setup_logging(config).is_ok());
    }

    #[test]
    #[serial]
    fn test_logging_system_force_reinit() {
        LoggingSystem::reset_for_testing();

        let config = create_test_config();
        LoggingSystem::setup_logging(config.clone()).unwrap();

        let result = LoggingSystem::setup_logging_with_options(config, true);
        assert!(result.is_ok());
    }

    #[test]
    #[serial]
    fn test_logging_system_with_json_format() {
        LoggingSystem::reset_for_testing();

        let config = LogConfig {
            json_format: true,
            ..create_test_config()
        };
        let system = LoggingSystem::setup_logging(config).unwrap();
        assert!(system.config().json_format);
    }

    #[test]
    #[serial]
    fn test_current_config_retrieval() {
        LoggingSystem::reset_for_testing();

        let config = create_test_config();
        let _system = LoggingSystem::setup_logging(config.clone()).unwrap();

        assert_eq!(LoggingSystem::current_config(), Some(config));
    }

    #[test]
    fn test_default_level_is_warn() {
        assert_eq!(LogConfig::default().level, LevelFilter::Warn);
    }

    #[test]
    fn test_level_directive() {
        assert_eq!(
            LoggingSystem::convert_level_to_directive(LevelFilter::Debug).to_string(),
            "debug"
        );
    }
}
