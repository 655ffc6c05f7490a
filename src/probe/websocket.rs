//! WebSocket 探测器实现
//!
//! 完成一次升级握手后立即关闭连接

use crate::error::ProbeError;
use crate::probe::{user_agent, Probe, ProbeContext};
use crate::target::Target;
use async_trait::async_trait;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{HeaderValue, USER_AGENT};
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::debug;

/// WebSocket 探测器
#[derive(Debug, Clone)]
pub struct WebSocketProber {
    target: Target,
}

impl WebSocketProber {
    /// 创建新的WebSocket探测器
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    /// 探测目标
    pub fn target(&self) -> &Target {
        &self.target
    }

    fn classify_error(error: WsError) -> ProbeError {
        match error {
            WsError::Io(e) => {
                ProbeError::Connect(format!("failed in opening WebSocket connection: {e}"))
            }
            WsError::Tls(e) => {
                ProbeError::Connect(format!("failed in opening WebSocket connection: {e}"))
            }
            WsError::Url(e) => {
                ProbeError::Connect(format!("failed in opening WebSocket connection: {e}"))
            }
            WsError::Http(response) => ProbeError::Protocol(format!(
                "failed in WebSocket handshake: HTTP {}",
                response.status()
            )),
            other => ProbeError::Protocol(format!("failed in WebSocket handshake: {other}")),
        }
    }
}

#[async_trait]
impl Probe for WebSocketProber {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        self.target.addr().await
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let url = self.target.to_url()?;
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(Self::classify_error)?;
        let agent = HeaderValue::from_str(&user_agent())
            .map_err(|e| ProbeError::Internal(format!("invalid user agent: {e}")))?;
        request.headers_mut().insert(USER_AGENT, agent);

        let (mut stream, response) = ctx
            .guard(connect_async(request))
            .await?
            .map_err(Self::classify_error)?;
        debug!("WebSocket握手完成: {} {}", self.target, response.status());

        // 关闭失败不影响探测结果
        if let Ok(Err(e)) = ctx.guard(stream.close(None)).await {
            debug!("关闭WebSocket连接失败: {}", e);
        }

        Ok(())
    }
}
