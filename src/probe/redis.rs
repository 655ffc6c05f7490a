//! Redis 探测器实现
//!
//! 发送 `PING`，响应必须是 `PONG`

use crate::error::ProbeError;
use crate::probe::{Probe, ProbeContext};
use crate::target::Target;
use async_trait::async_trait;
use redis::RedisResult;
use tracing::debug;
use url::Url;

/// Redis 探测器
#[derive(Debug, Clone)]
pub struct RedisProber {
    target: Target,
    password: Option<String>,
    db: i64,
}

impl RedisProber {
    /// 创建新的Redis探测器
    ///
    /// # 参数
    /// * `target` - 探测目标
    /// * `password` - 用户信息中的密码（已解码）
    /// * `db` - 数据库编号
    pub fn new(target: Target, password: Option<String>, db: i64) -> Self {
        Self {
            target,
            password,
            db,
        }
    }

    /// 探测目标
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// 密码
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// 数据库编号
    pub fn db(&self) -> i64 {
        self.db
    }

    /// 构建客户端连接地址
    fn connection_url(&self, port: u16) -> Result<Url, ProbeError> {
        let mut url = Url::parse(&format!(
            "redis://{}:{}/{}",
            self.target.authority_host(),
            port,
            self.db
        ))
        .map_err(|e| ProbeError::Internal(format!("failed in building Redis URL: {e}")))?;

        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|_| ProbeError::Internal("failed in setting Redis password".to_string()))?;
        }

        Ok(url)
    }
}

#[async_trait]
impl Probe for RedisProber {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        self.target.addr().await
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let (_, port) = ctx.guard(self.addr()).await??;
        let url = self.connection_url(port)?;

        let client = redis::Client::open(url.as_str())
            .map_err(|e| ProbeError::Connect(format!("failed in creating Redis client: {e}")))?;
        let mut conn = ctx
            .guard(client.get_multiplexed_async_connection())
            .await?
            .map_err(|e| ProbeError::Connect(format!("failed in connecting to Redis: {e}")))?;

        let reply: RedisResult<String> = ctx
            .guard(redis::cmd("PING").query_async(&mut conn))
            .await?;
        let reply = reply.map_err(|e| ProbeError::Protocol(format!("failed in PING command: {e}")))?;

        debug!("Redis探测响应: {} {}", self.target, reply);
        if reply != "PONG" {
            return Err(ProbeError::Protocol(format!(
                "invalid redis response: {reply:?}"
            )));
        }

        Ok(())
    }
}
