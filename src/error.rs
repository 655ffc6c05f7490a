//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use std::time::Duration;
use thiserror::Error;

/// LiveProbe 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum LiveProbeError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 目标解析错误
    #[error("目标解析错误: {0}")]
    Resolve(#[from] ResolveError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 目标解析错误类型
///
/// 解析失败在启动时即为致命错误，不会重试。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// 目标为空、无法解析，或缺少必需的端口
    #[error("invalid target: {reason}")]
    InvalidInput {
        reason: String,
        #[source]
        source: Option<url::ParseError>,
    },

    /// 不支持的协议
    #[error("unknown scheme: {0}")]
    UnknownScheme(String),

    /// Redis 数据库编号不是数字
    #[error("invalid db number: {0:?}")]
    InvalidDb(String),
}

impl ResolveError {
    /// 不附带底层原因的无效输入错误
    pub fn invalid(reason: impl Into<String>) -> Self {
        ResolveError::InvalidInput {
            reason: reason.into(),
            source: None,
        }
    }
}

/// 单次探测错误类型
///
/// 这些错误只用于记录和展示，从不打断运行器。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// 符号端口或主机地址解析失败
    #[error("address resolution failed: {0}")]
    AddrResolution(String),

    /// 建立底层连接失败
    #[error("connection failed: {0}")]
    Connect(String),

    /// 对端响应了，但响应无效（包括 HTTP 状态码 >= 400）
    #[error("protocol error: {0}")]
    Protocol(String),

    /// 截止时间已过
    #[error("deadline exceeded after {0:?}")]
    Timeout(Duration),

    /// 探测任务本身异常退出
    #[error("probe task failed: {0}")]
    Internal(String),
}

impl ProbeError {
    /// 是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::Timeout(_))
    }
}

/// 运行器错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerError {
    /// 运行器只能启动一次
    #[error("运行器已启动，不能重复运行")]
    AlreadyStarted,
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, LiveProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_display() {
        assert_eq!(
            ResolveError::UnknownScheme("weird".to_string()).to_string(),
            "unknown scheme: weird"
        );
        assert_eq!(
            ResolveError::InvalidDb("abc".to_string()).to_string(),
            "invalid db number: \"abc\""
        );
    }

    #[test]
    fn test_probe_error_is_timeout() {
        assert!(ProbeError::Timeout(Duration::from_millis(50)).is_timeout());
        assert!(!ProbeError::Connect("refused".to_string()).is_timeout());
    }

    #[test]
    fn test_error_conversion() {
        let err: LiveProbeError = ResolveError::invalid("empty").into();
        assert!(err.to_string().contains("invalid target: empty"));

        let err: LiveProbeError = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert!(matches!(err, LiveProbeError::Io(_)));
    }

    #[test]
    fn test_invalid_input_keeps_url_error_as_source() {
        use std::error::Error as _;

        let err = ResolveError::InvalidInput {
            reason: "failed in parsing URL".to_string(),
            source: Some(url::ParseError::InvalidPort),
        };
        assert_eq!(err.to_string(), "invalid target: failed in parsing URL");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some(url::ParseError::InvalidPort.to_string())
        );
        assert!(ResolveError::invalid("empty").source().is_none());
    }
}
