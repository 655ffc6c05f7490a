//! 探测器模块
//!
//! 定义探测能力接口、共享截止时间上下文，以及各协议探测器

pub mod amqp;
pub mod http;
pub mod mysql;
pub mod postgres;
pub mod redis;
pub mod tcp;
pub mod websocket;

use crate::error::ProbeError;
use crate::target::Target;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

// 重新导出主要类型
pub use self::amqp::AmqpProber;
pub use self::http::HttpProber;
pub use self::mysql::MySqlProber;
pub use self::postgres::PostgresProber;
pub use self::redis::RedisProber;
pub use self::tcp::TcpProber;
pub use self::websocket::WebSocketProber;

/// 探测请求携带的 User-Agent
pub fn user_agent() -> String {
    format!("{}/{}", crate::APP_NAME, crate::VERSION)
}

/// 单次探测共享的截止时间上下文
///
/// 探测器内部的每一次等待都应通过 [`ProbeContext::guard`] 进行，
/// 截止时间一到即放弃正在进行的拨号或读写。
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext {
    deadline: Instant,
    timeout: Duration,
}

impl ProbeContext {
    /// 以当前时刻为起点创建上下文
    pub fn new(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout, timeout)
    }

    /// 使用给定的截止时间创建上下文
    pub fn with_deadline(deadline: Instant, timeout: Duration) -> Self {
        Self { deadline, timeout }
    }

    /// 截止时间
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// 本次探测的总时长预算
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 距离截止时间的剩余时长
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// 截止时间是否已过
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// 在截止时间内等待 future 完成
    pub async fn guard<F>(&self, future: F) -> Result<F::Output, ProbeError>
    where
        F: Future,
    {
        timeout_at(self.deadline, future)
            .await
            .map_err(|_| ProbeError::Timeout(self.timeout))
    }
}

/// 探测能力接口
#[async_trait]
pub trait Probe: Send + Sync {
    /// 惰性解析 `(主机名, 端口)`
    async fn addr(&self) -> Result<(String, u16), ProbeError>;

    /// 进行一次独立的可达性检测
    ///
    /// 每次调用都从干净状态开始，不复用之前的连接；
    /// 实现必须在 `ctx` 截止后尽快返回。
    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError>;
}

/// 各协议探测器的封闭集合，由解析器一次性确定
#[derive(Debug, Clone)]
pub enum Prober {
    Http(HttpProber),
    Tcp(TcpProber),
    WebSocket(WebSocketProber),
    MySql(MySqlProber),
    Postgres(PostgresProber),
    Redis(RedisProber),
    Amqp(AmqpProber),
}

impl Prober {
    /// 探测目标
    pub fn target(&self) -> &Target {
        match self {
            Prober::Http(p) => p.target(),
            Prober::Tcp(p) => p.target(),
            Prober::WebSocket(p) => p.target(),
            Prober::MySql(p) => p.target(),
            Prober::Postgres(p) => p.target(),
            Prober::Redis(p) => p.target(),
            Prober::Amqp(p) => p.target(),
        }
    }

    /// 协议名称
    pub fn kind(&self) -> &'static str {
        match self {
            Prober::Http(_) => "http",
            Prober::Tcp(_) => "tcp",
            Prober::WebSocket(_) => "websocket",
            Prober::MySql(_) => "mysql",
            Prober::Postgres(_) => "postgres",
            Prober::Redis(_) => "redis",
            Prober::Amqp(_) => "amqp",
        }
    }
}

#[async_trait]
impl Probe for Prober {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        match self {
            Prober::Http(p) => p.addr().await,
            Prober::Tcp(p) => p.addr().await,
            Prober::WebSocket(p) => p.addr().await,
            Prober::MySql(p) => p.addr().await,
            Prober::Postgres(p) => p.addr().await,
            Prober::Redis(p) => p.addr().await,
            Prober::Amqp(p) => p.addr().await,
        }
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        match self {
            Prober::Http(p) => p.ping(ctx).await,
            Prober::Tcp(p) => p.ping(ctx).await,
            Prober::WebSocket(p) => p.ping(ctx).await,
            Prober::MySql(p) => p.ping(ctx).await,
            Prober::Postgres(p) => p.ping(ctx).await,
            Prober::Redis(p) => p.ping(ctx).await,
            Prober::Amqp(p) => p.ping(ctx).await,
        }
    }
}

/// 将 sqlx 错误归类为探测错误
pub(crate) fn sqlx_error(action: &str, error: sqlx::Error) -> ProbeError {
    match error {
        sqlx::Error::Io(e) => ProbeError::Connect(format!("{action}: {e}")),
        sqlx::Error::Tls(e) => ProbeError::Connect(format!("{action}: {e}")),
        sqlx::Error::Configuration(e) => ProbeError::Connect(format!("{action}: {e}")),
        sqlx::Error::PoolTimedOut => ProbeError::Connect(format!("{action}: pool timed out")),
        other => ProbeError::Protocol(format!("{action}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_passes_result_through() {
        let ctx = ProbeContext::new(Duration::from_secs(1));
        assert_eq!(ctx.guard(async { 42 }).await.unwrap(), 42);
        assert!(!ctx.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_times_out_at_deadline() {
        let ctx = ProbeContext::new(Duration::from_millis(50));
        let err = ctx
            .guard(tokio::time::sleep(Duration::from_secs(10)))
            .await
            .unwrap_err();

        assert_eq!(err, ProbeError::Timeout(Duration::from_millis(50)));
        assert!(ctx.is_expired());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_user_agent() {
        assert!(user_agent().starts_with("liveprobe/"));
    }

    #[tokio::test]
    async fn test_prober_kind_and_target() {
        let prober = crate::target::resolve("redis://cache").await.unwrap();
        assert_eq!(prober.kind(), "redis");
        assert_eq!(prober.target().host(), "cache");
        assert_eq!(prober.addr().await.unwrap(), ("cache".to_string(), 6379));
    }
}
