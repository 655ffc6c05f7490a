//! TCP 探测器实现
//!
//! 建立一次 TCP 连接后立即关闭。`tcp4` / `tcp6` 限定解析出的地址族。

use crate::error::ProbeError;
use crate::probe::{Probe, ProbeContext};
use crate::target::Target;
use async_trait::async_trait;
use std::net::SocketAddr;
use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

/// TCP 探测器
#[derive(Debug, Clone)]
pub struct TcpProber {
    target: Target,
}

impl TcpProber {
    /// 创建新的TCP探测器
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    /// 探测目标
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// 网络类型：`tcp`、`tcp4` 或 `tcp6`
    pub fn network(&self) -> &str {
        self.target.scheme()
    }

    /// 按网络类型过滤地址
    fn accepts(&self, addr: &SocketAddr) -> bool {
        match self.network() {
            "tcp4" => addr.is_ipv4(),
            "tcp6" => addr.is_ipv6(),
            _ => true,
        }
    }
}

#[async_trait]
impl Probe for TcpProber {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        self.target.addr().await
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        let (host, port) = ctx.guard(self.addr()).await??;
        let address = format!("{}:{}", self.target.authority_host(), port);

        let candidates: Vec<SocketAddr> = ctx
            .guard(lookup_host((host.as_str(), port)))
            .await?
            .map_err(|e| ProbeError::AddrResolution(format!("failed in resolving {address}: {e}")))?
            .filter(|addr| self.accepts(addr))
            .collect();

        if candidates.is_empty() {
            return Err(ProbeError::AddrResolution(format!(
                "no address of {} found for {address}",
                self.network()
            )));
        }

        let mut last_error = None;
        for candidate in candidates {
            match ctx.guard(TcpStream::connect(candidate)).await? {
                Ok(_stream) => {
                    debug!("TCP连接成功: {} ({})", address, candidate);
                    return Ok(());
                }
                Err(e) => {
                    debug!("TCP连接失败: {} ({}): {}", address, candidate, e);
                    last_error = Some(e);
                }
            }
        }

        Err(ProbeError::Connect(format!(
            "failed in connecting {address} on {}: {}",
            self.network(),
            last_error.map_or_else(|| "no reachable address".to_string(), |e| e.to_string())
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::Prober;
    use crate::target::resolve;
    use std::time::Duration;
    use tokio::net::TcpListener;

    async fn tcp_prober(raw: &str) -> TcpProber {
        match resolve(raw).await.unwrap() {
            Prober::Tcp(prober) => prober,
            other => panic!("unexpected prober: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = tcp_prober(&format!("tcp://127.0.0.1:{port}")).await;
        let result = prober.ping(&ProbeContext::new(Duration::from_secs(5))).await;

        assert!(result.is_ok(), "unexpected error: {result:?}");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = tcp_prober(&format!("tcp4://127.0.0.1:{port}")).await;
        let err = prober
            .ping(&ProbeContext::new(Duration::from_secs(5)))
            .await
            .unwrap_err();

        assert!(matches!(err, ProbeError::Connect(_)), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_address_family_filter() {
        let prober = tcp_prober("tcp6://127.0.0.1:80").await;
        let err = prober
            .ping(&ProbeContext::new(Duration::from_secs(5)))
            .await
            .unwrap_err();

        assert!(
            matches!(err, ProbeError::AddrResolution(_)),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn test_addr_is_explicit() {
        let prober = tcp_prober("tcp://example.com:22").await;
        assert_eq!(prober.network(), "tcp");
        assert_eq!(
            prober.addr().await.unwrap(),
            ("example.com".to_string(), 22)
        );
    }
}
