//! 目标解析器
//!
//! 将自由格式的目标字符串解析为对应协议的探测器：
//! `scheme://[user[:password]@]host[:port][/path][?query]`，
//! 或者省略协议的 `host[:port]`（按 `http://` 处理）。

use crate::error::ResolveError;
use crate::probe::{
    AmqpProber, HttpProber, MySqlProber, PostgresProber, Prober, RedisProber, TcpProber,
    WebSocketProber,
};
use crate::target::{services, Port, Target};
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};
use url::Url;

/// 主机名为空时使用的地址
const DEFAULT_HOST: &str = "127.0.0.1";

/// 各协议的默认值
const MYSQL_PORT: u16 = 3306;
const REDIS_PORT: u16 = 6379;
const AMQP_PORT: u16 = 5672;
const POSTGRES_PATH: &str = "/postgres";
const POSTGRES_QUERY: &str = "sslmode=disable";

/// 解析目标字符串
///
/// # 参数
/// * `raw` - 目标字符串
///
/// # 返回
/// * `Result<Prober, ResolveError>` - 配置好的探测器或解析错误
pub async fn resolve(raw: &str) -> Result<Prober, ResolveError> {
    if raw.is_empty() {
        return Err(ResolveError::invalid("\"\" (empty)".to_string()));
    }

    let mut target = parse_target(raw).await?;
    debug!("目标解析完成: {} -> {}", raw, target);

    let prober = match target.scheme.as_str() {
        "http" | "https" => Prober::Http(HttpProber::new(target)),
        "ws" | "wss" => Prober::WebSocket(WebSocketProber::new(target)),
        "tcp" | "tcp4" | "tcp6" => {
            if target.port.is_none() {
                return Err(ResolveError::invalid(format!(
                    "{raw:?}: port is required for {} targets",
                    target.scheme
                )));
            }
            Prober::Tcp(TcpProber::new(target))
        }
        "mysql" => {
            target.port.get_or_insert(Port::Number(MYSQL_PORT));
            Prober::MySql(MySqlProber::new(target))
        }
        "postgres" => {
            if target.path.is_empty() || target.path == "/" {
                target.path = POSTGRES_PATH.to_string();
            }
            if target.query.as_deref().map_or(true, str::is_empty) {
                target.query = Some(POSTGRES_QUERY.to_string());
            }
            Prober::Postgres(PostgresProber::new(target))
        }
        "redis" => {
            let db = parse_redis_db(&target.path)?;
            let password = target.password();
            target.port.get_or_insert(Port::Number(REDIS_PORT));
            Prober::Redis(RedisProber::new(target, password, db))
        }
        "amqp" => {
            target.port.get_or_insert(Port::Number(AMQP_PORT));
            Prober::Amqp(AmqpProber::new(target))
        }
        other => return Err(ResolveError::UnknownScheme(other.to_string())),
    };

    Ok(prober)
}

/// 目标字符串的原始组成部分
#[derive(Debug, PartialEq, Eq)]
struct RawParts<'a> {
    scheme: String,
    userinfo: Option<&'a str>,
    host: &'a str,
    port: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
}

/// 拆分、补全并校验目标
async fn parse_target(raw: &str) -> Result<Target, ResolveError> {
    let parts = split_target(raw)?;

    let host = if parts.host.is_empty() {
        DEFAULT_HOST.to_string()
    } else {
        parts.host.to_string()
    };

    let port = match parts.port {
        None => None,
        Some(port) if port.bytes().all(|b| b.is_ascii_digit()) => {
            let number = port.parse::<u16>().map_err(|e| {
                ResolveError::invalid(format!("{raw:?}: invalid port {port}: {e}"))
            })?;
            Some(Port::Number(number))
        }
        Some(name) => match services::lookup_port(&parts.scheme, name).await {
            Ok(number) => Some(Port::Number(number)),
            Err(e) => {
                warn!("服务端口解析失败，保留原始端口名 {}: {}", name, e);
                Some(Port::Named(name.to_string()))
            }
        },
    };

    let target = Target {
        scheme: parts.scheme,
        userinfo: parts.userinfo.map(str::to_string),
        host,
        port,
        path: parts.path.to_string(),
        query: parts.query.map(str::to_string),
    };

    validate(raw, &target)?;
    Ok(target)
}

/// 按 RFC 3986 的结构拆分目标字符串
///
/// 没有 `scheme://` 前缀的字符串按 `http://` 处理；片段（`#...`）被丢弃。
fn split_target(raw: &str) -> Result<RawParts<'_>, ResolveError> {
    let (scheme, rest) = match raw.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => (scheme.to_ascii_lowercase(), rest),
        _ => {
            if raw.starts_with(':') {
                return Err(ResolveError::invalid(format!(
                    "{raw:?}: missing protocol scheme"
                )));
            }
            ("http".to_string(), raw)
        }
    };

    let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let (path, query) = match tail.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (tail, None),
    };

    let (userinfo, hostport) = match authority.rsplit_once('@') {
        Some((userinfo, hostport)) => (Some(userinfo), hostport),
        None => (None, authority),
    };

    let (host, port) = split_host_port(raw, hostport)?;

    Ok(RawParts {
        scheme,
        userinfo,
        host,
        port,
        path,
        query,
    })
}

fn split_host_port<'a>(
    raw: &str,
    hostport: &'a str,
) -> Result<(&'a str, Option<&'a str>), ResolveError> {
    let (host, port) = if let Some(bracketed) = hostport.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']').ok_or_else(|| {
            ResolveError::invalid(format!("{raw:?}: missing ']' in host"))
        })?;
        match after {
            "" => (host, None),
            _ => match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => {
                    return Err(ResolveError::invalid(format!(
                        "{raw:?}: unexpected {after:?} after host"
                    )))
                }
            },
        }
    } else {
        match hostport.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (hostport, None),
        }
    };

    Ok((host, port.filter(|port| !port.is_empty())))
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// 用 `url` 校验组装后的目标；未解析的符号端口不参与校验
fn validate(raw: &str, target: &Target) -> Result<(), ResolveError> {
    let candidate = match &target.port {
        Some(Port::Named(_)) => Target {
            port: None,
            ..target.clone()
        },
        _ => target.clone(),
    };

    Url::parse(&candidate.to_string())
        .map(|_| ())
        .map_err(|e| ResolveError::InvalidInput {
            reason: format!("failed in parsing URL {raw:?}"),
            source: Some(e),
        })
}

/// 从路径的第一段解析 Redis 数据库编号
fn parse_redis_db(path: &str) -> Result<i64, ResolveError> {
    let segment = path
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();

    if segment.is_empty() {
        return Ok(0);
    }

    let decoded = percent_decode_str(segment)
        .decode_utf8()
        .map_err(|_| ResolveError::InvalidDb(segment.to_string()))?;

    decoded
        .parse()
        .map_err(|_| ResolveError::InvalidDb(decoded.into_owned()))
}
