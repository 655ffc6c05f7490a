//! 服务端口查询
//!
//! 将 `http`、`mysql` 这类服务名转换为数字端口。查询先读取系统的
//! services 数据库，读取失败或超时时回退到内置的知名端口表。

use crate::error::ProbeError;
use std::path::Path;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// 单次服务名查询的时间上限
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(1);

/// 系统 services 数据库位置
const SERVICES_FILE: &str = "/etc/services";

/// 内置的知名 TCP 端口表
const WELL_KNOWN_PORTS: &[(&str, u16)] = &[
    ("ftp", 21),
    ("ssh", 22),
    ("telnet", 23),
    ("smtp", 25),
    ("domain", 53),
    ("http", 80),
    ("www", 80),
    ("pop3", 110),
    ("imap", 143),
    ("ldap", 389),
    ("https", 443),
    ("mysql", 3306),
    ("postgresql", 5432),
    ("postgres", 5432),
    ("amqp", 5672),
    ("redis", 6379),
];

/// 查询服务名对应的端口
///
/// 数字字符串直接返回；其余情况的查询时间不超过 [`LOOKUP_TIMEOUT`]。
pub async fn lookup_port(network: &str, service: &str) -> Result<u16, ProbeError> {
    lookup_port_in(Path::new(SERVICES_FILE), network, service).await
}

/// 在指定的 services 文件中查询端口
pub async fn lookup_port_in(
    services_file: &Path,
    network: &str,
    service: &str,
) -> Result<u16, ProbeError> {
    if let Ok(port) = service.parse::<u16>() {
        return Ok(port);
    }

    let protocol = protocol_of(network);
    let from_file = timeout(LOOKUP_TIMEOUT, async {
        let content = tokio::fs::read_to_string(services_file).await.ok()?;
        find_port(&content, protocol, service)
    })
    .await;

    match from_file {
        Ok(Some(port)) => Ok(port),
        Ok(None) => well_known_port(service).ok_or_else(|| unknown_port(service, protocol)),
        Err(_) => {
            debug!("服务端口查询超时: {}/{}", service, protocol);
            well_known_port(service).ok_or_else(|| unknown_port(service, protocol))
        }
    }
}

/// 在 services 文件内容中查找端口
///
/// 每行格式为 `name port/protocol [aliases...]`，`#` 之后为注释。
pub fn find_port(content: &str, protocol: &str, service: &str) -> Option<u16> {
    content.lines().find_map(|line| {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        let name = fields.next()?;
        let (port, proto) = fields.next()?.split_once('/')?;
        if !proto.eq_ignore_ascii_case(protocol) {
            return None;
        }

        let matches = name.eq_ignore_ascii_case(service)
            || fields.any(|alias| alias.eq_ignore_ascii_case(service));
        if matches {
            port.parse().ok()
        } else {
            None
        }
    })
}

fn well_known_port(service: &str) -> Option<u16> {
    WELL_KNOWN_PORTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(service))
        .map(|(_, port)| *port)
}

fn protocol_of(network: &str) -> &'static str {
    if network.starts_with("udp") {
        "udp"
    } else {
        "tcp"
    }
}

fn unknown_port(service: &str, protocol: &str) -> ProbeError {
    ProbeError::AddrResolution(format!("unknown port {service}/{protocol}"))
}
