//! 运行器端到端测试
//!
//! 解析真实目标，经运行器和输出层产生完整的记录流

use async_trait::async_trait;
use liveprobe::error::ProbeError;
use liveprobe::probe::{Probe, ProbeContext};
use liveprobe::report::{build_reporter, OutputFormat};
use liveprobe::{resolve, Runner, RunnerConfig, StatsMode};
use serde_json::Value;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// 可在测试中读回的共享输出
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    fn json_lines(&self) -> Vec<Value> {
        self.text()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// 永不返回的探测器
struct HangingProbe;

#[async_trait]
impl Probe for HangingProbe {
    async fn addr(&self) -> Result<(String, u16), ProbeError> {
        Ok(("hanging".to_string(), 1))
    }

    async fn ping(&self, ctx: &ProbeContext) -> Result<(), ProbeError> {
        ctx.guard(std::future::pending::<()>()).await
    }
}

fn config(count: u64, timeout: Duration) -> RunnerConfig {
    RunnerConfig {
        count,
        interval: Duration::from_millis(10),
        timeout,
        stats: StatsMode::All,
        parallel: false,
    }
}

#[tokio::test]
async fn test_tcp_targets_json_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let open = format!("tcp://127.0.0.1:{}", listener.local_addr().unwrap().port());

    let closed_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = format!(
        "tcp://127.0.0.1:{}",
        closed_listener.local_addr().unwrap().port()
    );
    drop(closed_listener);

    let targets = vec![open.clone(), closed.clone()];
    let buffer = SharedBuffer::default();
    let reporter = build_reporter(OutputFormat::Json, &targets, false, buffer.clone());

    let mut runner = Runner::new(config(2, Duration::from_secs(5)), reporter);
    for target in &targets {
        runner.add_target(target.clone(), Arc::new(resolve(target).await.unwrap()));
    }

    let stats = runner.run().await.unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!((stats[0].ok, stats[0].total), (2, 2));
    assert_eq!((stats[1].error, stats[1].total), (2, 2));

    let lines = buffer.json_lines();
    assert_eq!(lines.len(), 6);

    let pings: Vec<(&str, &str)> = lines[..4]
        .iter()
        .map(|line| {
            assert_eq!(line["type"], "ping");
            (
                line["payload"]["target"].as_str().unwrap(),
                line["payload"]["status"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        pings,
        vec![
            (open.as_str(), "ok"),
            (closed.as_str(), "error"),
            (open.as_str(), "ok"),
            (closed.as_str(), "error"),
        ]
    );
    assert!(lines[0]["payload"].get("err").is_none());
    assert!(lines[1]["payload"]["err"].is_string());

    assert_eq!(lines[4]["type"], "stats");
    assert_eq!(lines[4]["payload"]["ok"], 2);
    assert_eq!(lines[5]["payload"]["error"], 2);
}

#[tokio::test]
async fn test_hanging_probe_is_reported_as_timeout() {
    let targets = vec!["hanging".to_string()];
    let buffer = SharedBuffer::default();
    let reporter = build_reporter(OutputFormat::Console, &targets, false, buffer.clone());

    let mut runner = Runner::new(config(1, Duration::from_millis(50)), reporter);
    runner.add_target("hanging", Arc::new(HangingProbe));

    let started = std::time::Instant::now();
    let stats = runner.run().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(stats[0].timeout, 1);
    assert_eq!(stats[0].error, 0);

    let text = buffer.text();
    assert!(text.starts_with("hanging -> timeout "), "unexpected output: {text:?}");
    assert!(text.contains("hanging: ok/timeout/error/total =  0/ 1/ 0/ 1"));
}

#[tokio::test]
async fn test_http_target_against_mock_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("HEAD", "/health")
        .with_status(200)
        .expect(3)
        .create_async()
        .await;

    let target = format!("{}/health", server.url());
    let targets = vec![target.clone()];
    let buffer = SharedBuffer::default();
    let reporter = build_reporter(OutputFormat::Json, &targets, false, buffer.clone());

    let mut cfg = config(3, Duration::from_secs(5));
    cfg.stats = StatsMode::Only;
    let mut runner = Runner::new(cfg, reporter);
    runner.add_target(target.clone(), Arc::new(resolve(&target).await.unwrap()));

    let stats = runner.run().await.unwrap();
    mock.assert_async().await;

    assert!(stats[0].all_ok());
    let lines = buffer.json_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["type"], "stats");
    assert_eq!(lines[0]["payload"]["total"], 3);
}
