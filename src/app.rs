//! 应用程序核心逻辑
//!
//! 加载并合并配置、解析全部目标、组装运行器

use crate::cli::Args;
use crate::config::{locate_config, validate_settings, ConfigLoader, Settings, TomlConfigLoader};
use crate::error::{ConfigError, Result};
use crate::health::Runner;
use crate::probe::Prober;
use crate::report::{build_reporter, ColorChoice, Reporter};
use crate::target::resolve;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 加载配置文件（如果有）并与命令行参数合并
///
/// # 参数
/// * `args` - 命令行参数
///
/// # 返回
/// * `Result<Settings>` - 合并并验证后的运行设置
pub async fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings = match locate_config(args.config.as_deref()) {
        Some(path) => {
            let loader = TomlConfigLoader::default();
            Settings::from_file(loader.load_from_file(&path).await?)
        }
        None => {
            debug!("未找到配置文件，使用默认设置");
            Settings::default()
        }
    };

    args.apply_to(&mut settings);
    validate_settings(&settings).map_err(ConfigError::ValidationError)?;

    debug!("运行设置: {:?}", settings);
    Ok(settings)
}

/// 按输入顺序解析全部目标，任何一个失败即返回错误
pub async fn resolve_targets(targets: &[String]) -> Result<Vec<Prober>> {
    let mut probers = Vec::with_capacity(targets.len());

    for target in targets {
        match resolve(target).await {
            Ok(prober) => {
                debug!("目标 {} 解析为 {} ({})", target, prober.target(), prober.kind());
                probers.push(prober);
            }
            Err(e) => {
                match std::error::Error::source(&e) {
                    Some(cause) => error!("解析目标失败: {}: {} ({})", target, e, cause),
                    None => error!("解析目标失败: {}: {}", target, e),
                }
                return Err(e.into());
            }
        }
    }

    Ok(probers)
}

/// 决定是否启用颜色，并同步到 `colored` 的全局开关
pub fn resolve_color(choice: ColorChoice) -> bool {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
    let enabled = choice.enabled(std::io::stdout().is_terminal(), no_color);
    colored::control::set_override(enabled);
    enabled
}

/// 组装运行器
///
/// # 参数
/// * `settings` - 运行设置
/// * `probers` - 与 `settings.targets` 一一对应的探测器
/// * `reporter` - 结果输出回调
pub fn build_runner(settings: &Settings, probers: Vec<Prober>, reporter: Box<dyn Reporter>) -> Runner {
    let mut runner = Runner::new(settings.runner.clone(), reporter);
    for (name, prober) in settings.targets.iter().zip(probers) {
        runner.add_target(name.clone(), Arc::new(prober));
    }
    runner
}

/// 从命令行参数准备好可以运行的运行器，输出写到标准输出
pub async fn prepare(args: &Args) -> Result<Runner> {
    let settings = load_settings(args).await?;
    let probers = resolve_targets(&settings.targets).await?;

    let color = resolve_color(settings.color);
    let reporter = build_reporter(settings.format, &settings.targets, color, std::io::stdout());

    info!(
        "准备探测 {} 个目标，输出格式: {:?}",
        settings.targets.len(),
        settings.format
    );
    Ok(build_runner(&settings, probers, reporter))
}
