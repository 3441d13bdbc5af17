//! Real HTTP/1.1 over TCP against a server bound to an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;

use roster::health::Readiness;
use roster::middleware::BearerToken;
use roster::users::UserStore;
use roster::{app, Server};

async fn exchange(addr: std::net::SocketAddr, raw: String) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    String::from_utf8(buf).unwrap()
}

/// Reads exactly one response off a kept-alive connection.
async fn read_response(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed mid-response: {}", String::from_utf8_lossy(&buf));
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf).into_owned();
        if let Some(end) = text.find("\r\n\r\n") {
            let len = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                return text;
            }
        }
    }
}

#[tokio::test]
async fn serves_requests_and_shuts_down_on_signal() {
    let store = Arc::new(UserStore::seeded());
    let readiness = Readiness::new();
    let pipeline = app::pipeline(&store, &readiness, BearerToken::new("t0k"));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::from_listener(listener).serve_with_shutdown(pipeline, async move {
        let _ = stopped.await;
    }));

    let body = r#"{"name":"A","email":"a@x.com"}"#;
    let res = exchange(
        addr,
        format!(
            "POST /users HTTP/1.1\r\nhost: test\r\nauthorization: Bearer t0k\r\n\
             content-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len(),
        ),
    )
    .await;
    assert!(res.starts_with("HTTP/1.1 201"), "{res}");
    assert!(res.to_ascii_lowercase().contains("location: /users/3"), "{res}");
    assert!(res.ends_with(r#"{"id":3,"name":"A","email":"a@x.com"}"#), "{res}");

    let res = exchange(addr, "GET /users HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n".into()).await;
    assert!(res.starts_with("HTTP/1.1 401"), "{res}");

    let res = exchange(addr, "PURGE /users HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n".into()).await;
    assert!(res.starts_with("HTTP/1.1 405"), "{res}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
    assert_eq!(store.len(), 3);
}

#[tokio::test]
async fn idle_keep_alive_connection_does_not_block_shutdown() {
    let store = Arc::new(UserStore::seeded());
    let readiness = Readiness::new();
    let pipeline = app::pipeline(&store, &readiness, BearerToken::new("t0k"));

    let server = Server::bind(([127, 0, 0, 1], 0).into()).await.unwrap();
    let addr = server.local_addr().unwrap();
    readiness.set(true);

    let (stop, stopped) = oneshot::channel::<()>();
    let draining = readiness.clone();
    let server = tokio::spawn(server.serve_with_shutdown(pipeline, async move {
        let _ = stopped.await;
        draining.set(false);
    }));

    let mut conn = TcpStream::connect(addr).await.unwrap();
    let probe = "GET /readyz HTTP/1.1\r\nhost: test\r\n\r\n";

    conn.write_all(probe.as_bytes()).await.unwrap();
    let res = read_response(&mut conn).await;
    assert!(res.starts_with("HTTP/1.1 200"), "{res}");
    assert!(res.ends_with("ready"), "{res}");

    // Same connection, after readiness drops: load balancers see 503.
    readiness.set(false);
    conn.write_all(probe.as_bytes()).await.unwrap();
    let res = read_response(&mut conn).await;
    assert!(res.starts_with("HTTP/1.1 503"), "{res}");

    // The connection is idle but still open.
    readiness.set(true);
    stop.send(()).unwrap();
    timeout(Duration::from_secs(5), server)
        .await
        .expect("server drained within 5s")
        .unwrap()
        .unwrap();
    assert!(!readiness.is_ready());

    let mut rest = Vec::new();
    let closed = timeout(Duration::from_secs(5), conn.read_to_end(&mut rest)).await.expect("server closed the connection");
    assert!(closed.is_err() || rest.is_empty(), "{}", String::from_utf8_lossy(&rest));
}
