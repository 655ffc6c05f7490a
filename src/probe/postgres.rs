//! Postgres 探测器实现

use crate::error::ProbeError;
use crate::probe::{sqlx_error, Probe, ProbeContext};
use crate::target::Target;
use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::Connection;
use tracing::debug;

/// Postgres 探测器
///
/// 每次探测新建单个连接并发送 ping，完成后关闭。
#[derive(Debug, Clone)]
pub struct PostgresProber {
    target: Target,
}

impl PostgresProber {
    /// 创建新的Postgres探测器
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    /// 探测目标
    pub fn target(&self) -> &Target {
        &self.target
    }
}

#[async_trait]
impl Probe for PostgresProber {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        self.target.addr().await
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let url = self.target.to_url()?;

        let mut conn = ctx
            .guard(PgConnection::connect(url.as_str()))
            .await?
            .map_err(|e| sqlx_error("failed in connecting to Postgres", e))?;

        let result = ctx
            .guard(conn.ping())
            .await?
            .map_err(|e| sqlx_error("failed in Postgres ping", e));

        if let Ok(Err(e)) = ctx.guard(conn.close()).await {
            debug!("关闭Postgres连接失败: {}", e);
        }

        result
    }
}
