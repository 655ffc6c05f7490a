//! HTTP(S) 探测器实现
//!
//! 每次探测发送一个 `HEAD` 请求，状态码 >= 400 视为协议错误

use crate::error::ProbeError;
use crate::probe::{user_agent, Probe, ProbeContext};
use crate::target::Target;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::error::Error as StdError;
use tracing::debug;

/// HTTP(S) 探测器
#[derive(Debug, Clone)]
pub struct HttpProber {
    target: Target,
}

impl HttpProber {
    /// 创建新的HTTP探测器
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    /// 探测目标
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// 构建一次性的HTTP客户端
    ///
    /// 不保留空闲连接，保证每次探测都是新连接。
    fn build_client(&self, ctx: &ProbeContext) -> Result<Client, ProbeError> {
        Client::builder()
            .user_agent(user_agent())
            .timeout(ctx.remaining())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ProbeError::Internal(format!("failed in creating HTTP client: {e}")))
    }

    /// 验证响应状态码
    fn validate_status(status: StatusCode) -> Result<(), ProbeError> {
        if status.as_u16() >= 400 {
            return Err(ProbeError::Protocol(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }
        Ok(())
    }

    /// 将请求错误归类为探测错误
    fn classify_error(error: &reqwest::Error, ctx: &ProbeContext) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout(ctx.timeout())
        } else if error.is_connect() || error.is_builder() {
            ProbeError::Connect(format!("failed in HTTP request: {}", describe(error)))
        } else {
            ProbeError::Protocol(format!("failed in HTTP request: {}", describe(error)))
        }
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        self.target.addr().await
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let url = self.target.to_url()?;
        let client = self.build_client(ctx)?;

        let response = ctx
            .guard(client.head(url).send())
            .await?
            .map_err(|e| Self::classify_error(&e, ctx))?;

        debug!("HTTP探测响应: {} {}", self.target, response.status());
        Self::validate_status(response.status())
    }
}

/// 展开错误链，得到更易读的错误信息
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
