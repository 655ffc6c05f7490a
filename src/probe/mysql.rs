//! MySQL 探测器实现

use crate::error::ProbeError;
use crate::probe::{sqlx_error, Probe, ProbeContext};
use crate::target::Target;
use async_trait::async_trait;
use sqlx::mysql::MySqlConnection;
use sqlx::Connection;
use tracing::debug;

/// MySQL 探测器
///
/// 每次探测新建单个连接并发送 ping，完成后关闭。
#[derive(Debug, Clone)]
pub struct MySqlProber {
    target: Target,
}

impl MySqlProber {
    /// 创建新的MySQL探测器
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    /// 探测目标
    pub fn target(&self) -> &Target {
        &self.target
    }
}

#[async_trait]
impl Probe for MySqlProber {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        self.target.addr().await
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let url = self.target.to_url()?;

        let mut conn = ctx
            .guard(MySqlConnection::connect(url.as_str()))
            .await?
            .map_err(|e| sqlx_error("failed in connecting to MySQL", e))?;

        let result = ctx
            .guard(conn.ping())
            .await?
            .map_err(|e| sqlx_error("failed in MySQL ping", e));

        if let Ok(Err(e)) = ctx.guard(conn.close()).await {
            debug!("关闭MySQL连接失败: {}", e);
        }

        result
    }
}
