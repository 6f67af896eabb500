// tests/http_fuzzer.rs

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use vanguard_vhost::core::error::ProbeError;
use vanguard_vhost::core::fuzzer::{Fuzzer, HttpFuzzer, StaticResolver};
use vanguard_vhost::core::report::MemorySink;
use vanguard_vhost::{Options, Verdict, VhostScanner};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Server answering `admin.example.com` with a distinct page and every
/// other host with the default vhost.
async fn vhost_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("host", "admin.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<title>Admin</title> welcome back"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such site"))
        .mount(&server)
        .await;
    server
}

fn options_for(server: &MockServer) -> Options {
    Options {
        domains: vec!["example.com".into()],
        ips: vec!["127.0.0.1".into()],
        wordlist: vec!["admin".into(), "www".into(), "mail".into()],
        port: Some(server.address().port()),
        threads: 2,
        timeout: Duration::from_secs(5),
        ..Options::default()
    }
}

#[tokio::test]
async fn probe_sends_the_candidate_host() {
    let server = vhost_server().await;
    let fuzzer = HttpFuzzer::new(&options_for(&server)).unwrap();

    let hit = fuzzer.probe("127.0.0.1", "admin.example.com", "/").await.unwrap();
    assert_eq!(hit.status, 200);
    assert_eq!(hit.content_length, "<title>Admin</title> welcome back".len() as u64);

    let miss = fuzzer.probe("127.0.0.1", "www.example.com", "/").await.unwrap();
    assert_eq!(miss.status, 404);
    assert_eq!(miss.body_text(), "no such site");
}

#[tokio::test]
async fn default_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("x-scan-token", "abc"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let mut options = options_for(&server);
    options.headers = vec!["X-Scan-Token: abc".into()];
    let fuzzer = HttpFuzzer::new(&options).unwrap();

    let result = fuzzer.probe("127.0.0.1", "www.example.com", "/").await.unwrap();
    assert_eq!(result.status, 204);
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "https://elsewhere.example/"))
        .mount(&server)
        .await;

    let fuzzer = HttpFuzzer::new(&options_for(&server)).unwrap();
    let result = fuzzer.probe("127.0.0.1", "www.example.com", "/").await.unwrap();
    assert_eq!(result.status, 301);
}

#[tokio::test]
async fn refused_connection_is_a_request_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let options = Options {
        port: Some(port),
        timeout: Duration::from_secs(2),
        ..Options::default()
    };
    let fuzzer = HttpFuzzer::new(&options).unwrap();
    let err = fuzzer.probe("127.0.0.1", "www.example.com", "/").await.unwrap_err();
    assert!(matches!(err, ProbeError::Request { .. }));
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn truncated_body_keeps_the_status() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
            .await
            .unwrap();
        // Closing here leaves the body 95 bytes short.
    });

    let options = Options {
        port: Some(port),
        timeout: Duration::from_secs(2),
        ..Options::default()
    };
    let fuzzer = HttpFuzzer::new(&options).unwrap();
    let err = fuzzer.probe("127.0.0.1", "www.example.com", "/").await.unwrap_err();
    assert!(matches!(err, ProbeError::Body { status: 200, .. }));
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn public_probe_uses_the_resolver() {
    let server = vhost_server().await;
    let fuzzer = HttpFuzzer::new(&options_for(&server))
        .unwrap()
        .with_resolver(Arc::new(StaticResolver::new().with_entry("admin.example.com", LOCALHOST)));

    let public = fuzzer.probe_public("admin.example.com", "/").await.unwrap();
    assert_eq!(public.status, 200);

    let err = fuzzer.probe_public("ghost.example.com", "/").await.unwrap_err();
    assert!(matches!(err, ProbeError::Unresolvable { .. }));
}

#[tokio::test]
async fn scan_finds_the_hidden_vhost() {
    let server = vhost_server().await;
    let options = Arc::new(options_for(&server));
    let fuzzer = Arc::new(HttpFuzzer::new(&options).unwrap());
    let sink = Arc::new(MemorySink::new());

    let stats = VhostScanner::new(options, fuzzer, sink.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(stats.enqueued, 3);
    assert_eq!(stats.completed, 3);
    assert_eq!(stats.same, 2);

    let outcomes = sink.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].domain, "admin.example.com");
    assert_eq!(outcomes[0].verdict, Verdict::Confirmed);
    assert_eq!(outcomes[0].status, Some(200));

    let baselines = sink.baselines();
    assert_eq!(baselines.len(), 1);
    assert_eq!(baselines[0].status, Some(404));
}

#[tokio::test]
async fn verify_flags_publicly_served_hosts() {
    let server = vhost_server().await;
    let mut options = options_for(&server);
    options.verify = true;
    let options = Arc::new(options);
    // The public name points at the same server, so the hit is not hidden.
    let fuzzer = Arc::new(
        HttpFuzzer::new(&options)
            .unwrap()
            .with_resolver(Arc::new(StaticResolver::new().with_entry("admin.example.com", LOCALHOST))),
    );
    let sink = Arc::new(MemorySink::new());

    let stats = VhostScanner::new(options, fuzzer, sink.clone())
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(stats.likely_false_positive, 1);
    let outcomes = sink.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].verdict, Verdict::LikelyFalsePositive);
    assert!(outcomes[0].note.is_some());
}
