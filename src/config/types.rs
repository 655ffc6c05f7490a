//! 配置数据结构定义
//!
//! 定义配置文件结构、合并后的运行设置以及验证逻辑

use crate::health::{RunnerConfig, StatsMode};
use crate::report::{ColorChoice, OutputFormat};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// 配置文件结构，所有字段均可省略
///
/// ```toml
/// targets = ["localhost:8080", "redis://cache"]
/// count = 5
/// timeout = "2s"
/// interval = "500ms"
/// stats = "all"
/// format = "console"
/// color = "auto"
/// parallel = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// 探测目标列表
    pub targets: Vec<String>,
    /// 轮次，0 表示不限
    pub count: Option<u64>,
    /// 单次探测超时
    #[serde(deserialize_with = "duration_str::deserialize_option")]
    pub timeout: Option<Duration>,
    /// 两轮之间的间隔
    #[serde(deserialize_with = "duration_str::deserialize_option")]
    pub interval: Option<Duration>,
    /// 统计输出模式
    pub stats: Option<StatsMode>,
    /// 输出格式
    pub format: Option<OutputFormat>,
    /// 颜色输出选项
    pub color: Option<ColorChoice>,
    /// 同一轮内是否并发探测
    pub parallel: Option<bool>,
}

/// 合并配置文件、命令行参数和默认值之后的运行设置
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// 探测目标（保持输入顺序）
    pub targets: Vec<String>,
    /// 运行器配置
    pub runner: RunnerConfig,
    /// 输出格式
    pub format: OutputFormat,
    /// 颜色输出选项
    pub color: ColorChoice,
}

impl Settings {
    /// 在默认值之上应用配置文件
    pub fn from_file(file: FileConfig) -> Self {
        let defaults = RunnerConfig::default();

        Self {
            targets: file.targets,
            runner: RunnerConfig {
                count: file.count.unwrap_or(defaults.count),
                interval: file.interval.unwrap_or(defaults.interval),
                timeout: file.timeout.unwrap_or(defaults.timeout),
                stats: file.stats.unwrap_or(defaults.stats),
                parallel: file.parallel.unwrap_or(defaults.parallel),
            },
            format: file.format.unwrap_or_default(),
            color: file.color.unwrap_or_default(),
        }
    }
}

/// 配置文件验证函数
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_file_config(config: &FileConfig) -> Result<(), String> {
    if config.timeout == Some(Duration::ZERO) {
        return Err("超时时间必须大于0".to_string());
    }

    if let Some(target) = config.targets.iter().find(|t| t.trim().is_empty()) {
        return Err(format!("探测目标不能为空: {target:?}"));
    }

    Ok(())
}

/// 运行设置验证函数
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_settings(settings: &Settings) -> Result<(), String> {
    if settings.runner.timeout.is_zero() {
        return Err("超时时间必须大于0".to_string());
    }

    if settings.targets.is_empty() {
        return Err("至少需要一个探测目标".to_string());
    }

    Ok(())
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(crate::APP_NAME).join("config.toml"))
}

/// 解析时长字符串
///
/// 支持 `ns`、`us`（`µs`）、`ms`、`s`、`m`、`h` 单位，可以带小数并组合使用，
/// 例如 `500ms`、`1.5s`、`1m30s`。单独的 `0` 表示零时长。
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    const NANOS_PER_SEC: u128 = 1_000_000_000;

    let s = input.trim();
    if s.is_empty() {
        return Err("时长不能为空".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        rest = tail;

        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SEC,
            "m" => 60 * NANOS_PER_SEC,
            "h" => 3_600 * NANOS_PER_SEC,
            "" => return Err(format!("时长缺少单位: {input:?}")),
            other => return Err(format!("未知的时长单位 {other:?}: {input:?}")),
        };

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(format!("无效的时长: {input:?}"));
        }

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| format!("无效的时长: {input:?}"))?
        };
        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| format!("时长过大: {input:?}"))?;

        // 小数部分超过纳秒精度的位数直接舍去
        let fraction = &fraction[..fraction.len().min(18)];
        if !fraction.is_empty() {
            let digits: u128 = fraction
                .parse()
                .map_err(|_| format!("无效的时长: {input:?}"))?;
            value += digits * scale / 10u128.pow(fraction.len() as u32);
        }

        total = total
            .checked_add(value)
            .ok_or_else(|| format!("时长过大: {input:?}"))?;
    }

    let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| format!("时长过大: {input:?}"))?;
    let nanos = (total % NANOS_PER_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}

/// 配置文件中的时长字段
mod duration_str {
    use super::parse_duration;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| parse_duration(&s).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("10ns").unwrap(), Duration::from_nanos(10));
        assert_eq!(parse_duration("5us").unwrap(), Duration::from_micros(5));
        assert_eq!(parse_duration("5µs").unwrap(), Duration::from_micros(5));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_compound_and_fraction() {
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration(".5ms").unwrap(), Duration::from_micros(500));
        assert_eq!(
            parse_duration("1h2m3s4ms").unwrap(),
            Duration::from_millis(3_723_004)
        );
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10 days").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("1.2.3s").is_err());
    }

    #[test]
    fn test_file_config_parsing() {
        let config: FileConfig = toml::from_str(
            r#"
targets = ["localhost:8080", "redis://cache"]
count = 5
timeout = "2s"
interval = "500ms"
stats = "only"
format = "json"
color = "never"
parallel = true
"#,
        )
        .unwrap();

        assert_eq!(config.targets, vec!["localhost:8080", "redis://cache"]);
        assert_eq!(config.count, Some(5));
        assert_eq!(config.timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.interval, Some(Duration::from_millis(500)));
        assert_eq!(config.stats, Some(StatsMode::Only));
        assert_eq!(config.format, Some(OutputFormat::Json));
        assert_eq!(config.color, Some(ColorChoice::Never));
        assert_eq!(config.parallel, Some(true));
    }

    #[test]
    fn test_file_config_rejects_unknown_fields() {
        let result: Result<FileConfig, _> = toml::from_str("retries = 3");
        assert!(result.is_err());
    }

    #[test]
    fn test_file_config_rejects_bad_duration() {
        let result: Result<FileConfig, _> = toml::from_str("timeout = \"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_defaults_fill_gaps() {
        let settings = Settings::from_file(FileConfig {
            targets: vec!["localhost".to_string()],
            count: Some(3),
            ..Default::default()
        });

        assert_eq!(settings.runner.count, 3);
        assert_eq!(settings.runner.timeout, Duration::from_secs(10));
        assert_eq!(settings.runner.interval, Duration::from_secs(1));
        assert_eq!(settings.runner.stats, StatsMode::All);
        assert_eq!(settings.format, OutputFormat::Console);
        assert_eq!(settings.color, ColorChoice::Auto);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::from_file(FileConfig::default());
        assert!(validate_settings(&settings)
            .unwrap_err()
            .contains("至少需要一个探测目标"));

        settings.targets.push("localhost".to_string());
        settings.runner.timeout = Duration::ZERO;
        assert!(validate_settings(&settings).unwrap_err().contains("超时"));

        let file = FileConfig {
            timeout: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(validate_file_config(&file).is_err());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("liveprobe/config.toml"));
        }
    }
}
