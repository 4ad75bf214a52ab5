//! Shared helpers: a real proxy listener and a hit-counting upstream.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use recap_config::RecapConfig;
use recap_core::master::Master;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Minimal upstream: answers every request with `resp:<METHOD>:<hit-count>`
/// so a replayed response is distinguishable from a re-fetched one.
pub async fn spawn_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
    let addr = listener.local_addr().expect("upstream addr");
    let hits = Arc::new(AtomicUsize::new(0));

    let hits_clone = hits.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let n = hits_clone.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(serve_upstream_request(stream, n));
        }
    });

    (addr, hits)
}

async fn serve_upstream_request(mut stream: TcpStream, hit: usize) {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 4096];

    let headers_end = loop {
        let n = stream.read(&mut tmp).await.expect("upstream read");
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..headers_end]).to_string();
    let method = head.split_whitespace().next().unwrap_or("GET").to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body_got = buf.len() - headers_end - 4;
    while body_got < content_length {
        let n = stream.read(&mut tmp).await.expect("upstream body read");
        if n == 0 {
            break;
        }
        body_got += n;
    }

    let body = format!("resp:{method}:{hit}");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.flush().await;
}

/// Boot a proxy on an ephemeral port with an isolated cache directory.
pub async fn spawn_proxy(cache_dir: &Path) -> SocketAddr {
    spawn_proxy_with(RecapConfig::default(), cache_dir).await
}

/// Same, but with a caller-tuned configuration (limits, timeouts).
pub async fn spawn_proxy_with(mut cfg: RecapConfig, cache_dir: &Path) -> SocketAddr {
    cfg.cache.dir = cache_dir.to_string_lossy().into_owned();

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind proxy");
    let addr = listener.local_addr().expect("proxy addr");

    let master = Master::new(cfg).expect("master");
    tokio::spawn(async move {
        let _ = master.run_on(listener).await;
    });

    addr
}

pub fn cache_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read cache dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Write one raw request and collect everything the proxy answers with.
pub async fn raw_request(addr: SocketAddr, payload: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect proxy");
    stream.write_all(payload).await.expect("write request");
    stream.flush().await.expect("flush request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    String::from_utf8_lossy(&response).into_owned()
}
