use bugscan::engine::{Engine, EngineState, ScanConfig, ScanMode};
use bugscan::reporter::Reporter;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn quiet(engine: Engine) -> Engine {
    engine.with_reporter(Reporter::with_sink(Box::new(std::io::sink())))
}

/// Minimal HTTP fixture: accepts connections and answers every request
/// with a fixed Server header, in the spirit of a CDN edge.
async fn spawn_http_fixture() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(
                        b"HTTP/1.1 200 OK\r\nServer: Varnish\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    )
                    .await;
            });
        }
    });

    port
}

#[tokio::test]
async fn direct_scan_drains_queue_and_reports_every_target() {
    let port = spawn_http_fixture().await;

    let config = ScanConfig {
        mode: ScanMode::Direct,
        port,
        threads: 2,
        ..ScanConfig::default()
    };
    let engine = quiet(Engine::new(config).unwrap());

    // IP literals resolve to themselves, so each input yields exactly one
    // target. Only the first one has a listener behind it.
    let hostnames = vec![
        "127.0.0.1".to_string(),
        "127.0.0.2".to_string(),
        "127.0.0.3".to_string(),
    ];
    let records = engine.run(hostnames).await.unwrap();

    assert_eq!(engine.state(), EngineState::Done);
    assert_eq!(records.len(), 3);

    let alive = records.iter().find(|r| r.host == "127.0.0.1").unwrap();
    assert_eq!(alive.status_code, Some(200));
    assert_eq!(alive.server.as_deref(), Some("Varnish"));

    // Unreachable targets still produce a record, with empty fields.
    for dead in records.iter().filter(|r| r.host != "127.0.0.1") {
        assert_eq!(dead.status_code, None);
        assert_eq!(dead.server, None);
    }
}

#[tokio::test]
async fn duplicate_addresses_share_one_probe_result() {
    let port = spawn_http_fixture().await;

    let config = ScanConfig {
        mode: ScanMode::Direct,
        port,
        threads: 4,
        ..ScanConfig::default()
    };
    let engine = quiet(Engine::new(config).unwrap());

    // The same address queued twice: two result records, one cache entry.
    let records = engine
        .run(vec!["127.0.0.1".to_string(), "127.0.0.1".to_string()])
        .await
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records
        .iter()
        .all(|r| r.status_code == Some(200) && r.server.as_deref() == Some("Varnish")));
}

#[tokio::test]
async fn empty_input_completes_immediately() {
    let config = ScanConfig {
        mode: ScanMode::Direct,
        ..ScanConfig::default()
    };
    let engine = quiet(Engine::new(config).unwrap());

    let records = engine.run(Vec::new()).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(engine.state(), EngineState::Done);
}

#[tokio::test]
async fn unresolvable_hostnames_yield_no_records_but_still_drain() {
    let config = ScanConfig {
        mode: ScanMode::Direct,
        threads: 2,
        ..ScanConfig::default()
    };
    let engine = quiet(Engine::new(config).unwrap());

    let records = engine
        .run(vec![
            "one.does-not-exist.invalid".to_string(),
            "two.does-not-exist.invalid".to_string(),
        ])
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(engine.state(), EngineState::Done);
}

#[tokio::test]
async fn cancelled_scan_stops_before_probing() {
    let config = ScanConfig {
        mode: ScanMode::Direct,
        threads: 2,
        ..ScanConfig::default()
    };
    let engine = quiet(Engine::new(config).unwrap());

    let handle = engine.cancel_handle();
    handle.cancel();
    assert!(handle.is_cancelled());

    let records = engine
        .run(vec!["127.0.0.1".to_string(), "127.0.0.2".to_string()])
        .await
        .unwrap();

    assert!(records.is_empty());
    assert_eq!(engine.state(), EngineState::Done);
}

#[test]
fn proxy_mode_without_proxy_never_starts() {
    let config = ScanConfig {
        mode: ScanMode::Proxy,
        proxy: None,
        ..ScanConfig::default()
    };

    assert!(Engine::new(config).is_err());
}
