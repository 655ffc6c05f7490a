//! 探测目标模块
//!
//! 提供目标字符串解析、协议默认值填充和服务端口查询功能

pub mod resolver;
pub mod services;

use crate::error::ProbeError;
use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

// 重新导出主要类型
pub use resolver::resolve;
pub use services::lookup_port;

/// 目标端口
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Port {
    /// 数字端口
    Number(u16),
    /// 尚未解析成功的服务名（例如 `http`）
    Named(String),
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Port::Number(port) => write!(f, "{port}"),
            Port::Named(name) => write!(f, "{name}"),
        }
    }
}

/// 解析完成的探测目标
///
/// 由解析器在启动时创建一次，之后不再修改。主机名永远不为空。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub(crate) scheme: String,
    pub(crate) userinfo: Option<String>,
    pub(crate) host: String,
    pub(crate) port: Option<Port>,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
}

impl Target {
    /// 协议名（小写）
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// 主机名，IPv6 地址不带方括号
    pub fn host(&self) -> &str {
        &self.host
    }

    /// 显式给出的端口（可能是符号端口）
    pub fn port(&self) -> Option<&Port> {
        self.port.as_ref()
    }

    /// 路径（原样保留，可能为空）
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 查询字符串（不含 `?`）
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// 解码后的用户名
    pub fn username(&self) -> Option<String> {
        let userinfo = self.userinfo.as_deref()?;
        let name = userinfo.split_once(':').map_or(userinfo, |(name, _)| name);
        Some(decode(name))
    }

    /// 解码后的密码
    pub fn password(&self) -> Option<String> {
        let (_, password) = self.userinfo.as_deref()?.split_once(':')?;
        Some(decode(password))
    }

    /// 协议的知名端口
    pub fn default_port(&self) -> Option<u16> {
        match self.scheme.as_str() {
            "http" | "ws" => Some(80),
            "https" | "wss" => Some(443),
            "mysql" => Some(3306),
            "postgres" => Some(5432),
            "redis" => Some(6379),
            "amqp" => Some(5672),
            _ => None,
        }
    }

    /// 主机名在 authority 中的写法，IPv6 地址加方括号
    pub fn authority_host(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }

    /// 惰性解析 `(主机名, 端口)`
    ///
    /// 显式数字端口优先；符号端口会再次进行有界的服务名查询；
    /// 否则使用协议的知名端口。
    pub async fn addr(&self) -> Result<(String, u16), ProbeError> {
        let port = match &self.port {
            Some(Port::Number(port)) => *port,
            Some(Port::Named(name)) => lookup_port(&self.scheme, name).await?,
            None => self.default_port().ok_or_else(|| {
                ProbeError::AddrResolution(format!(
                    "scheme {} has no well-known port",
                    self.scheme
                ))
            })?,
        };

        Ok((self.host.clone(), port))
    }

    /// 转换为客户端库使用的 URL
    ///
    /// 符号端口未解析时无法构造 URL。
    pub fn to_url(&self) -> Result<Url, ProbeError> {
        if let Some(Port::Named(name)) = &self.port {
            return Err(ProbeError::AddrResolution(format!(
                "unresolved port name: {name}"
            )));
        }

        Url::parse(&self.to_string())
            .map_err(|e| ProbeError::Internal(format!("failed in building URL for {self}: {e}")))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(userinfo) = &self.userinfo {
            write!(f, "{userinfo}@")?;
        }
        write!(f, "{}", self.authority_host())?;
        if let Some(port) = &self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

fn decode(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
