//! Front-end rejection paths, exercised over raw TCP against a booted
//! proxy: unsupported methods, oversized heads and bodies, and chunked
//! request bodies. None of these may reach the cache or the upstream.

mod support;

use support::{cache_entries, raw_request, spawn_proxy, spawn_proxy_with};

use recap_config::RecapConfig;

#[tokio::test]
async fn unsupported_method_gets_405_even_with_a_body() {
    let cache = tempfile::tempdir().expect("tempdir");
    let proxy_addr = spawn_proxy(cache.path()).await;

    // The body rides along with the request; the proxy must drain it and
    // still deliver the rejection.
    let response = raw_request(
        proxy_addr,
        b"DELETE /http%3A/example.com/data HTTP/1.1\r\n\
          Host: proxy\r\n\
          Content-Length: 9\r\n\
          \r\n\
          unwanted!",
    )
    .await;

    assert!(
        response.starts_with("HTTP/1.1 405"),
        "unexpected response: {response}"
    );
    assert!(cache_entries(cache.path()).is_empty());
}

#[tokio::test]
async fn oversized_header_block_gets_431() {
    let cache = tempfile::tempdir().expect("tempdir");
    let mut cfg = RecapConfig::default();
    cfg.server.max_request_headers_bytes = 512;
    let proxy_addr = spawn_proxy_with(cfg, cache.path()).await;

    // Head grows past the limit without ever reaching the blank line, so
    // the proxy has to give up on it.
    let mut payload = b"GET /http%3A/example.com/data HTTP/1.1\r\nHost: proxy\r\n".to_vec();
    payload.extend_from_slice(format!("X-Padding: {}\r\n", "a".repeat(600)).as_bytes());

    let response = raw_request(proxy_addr, &payload).await;
    assert!(
        response.starts_with("HTTP/1.1 431"),
        "unexpected response: {response}"
    );
}

#[tokio::test]
async fn oversized_content_length_gets_413() {
    let cache = tempfile::tempdir().expect("tempdir");
    let mut cfg = RecapConfig::default();
    cfg.server.max_request_body_bytes = 1024;
    let proxy_addr = spawn_proxy_with(cfg, cache.path()).await;

    // Declared body exceeds the limit; the proxy rejects on the header
    // alone, before any body byte is sent.
    let response = raw_request(
        proxy_addr,
        b"POST /http%3A/example.com/upload HTTP/1.1\r\n\
          Host: proxy\r\n\
          Content-Length: 2048\r\n\
          \r\n",
    )
    .await;

    assert!(
        response.starts_with("HTTP/1.1 413"),
        "unexpected response: {response}"
    );
    assert!(cache_entries(cache.path()).is_empty());
}

#[tokio::test]
async fn chunked_request_body_gets_501() {
    let cache = tempfile::tempdir().expect("tempdir");
    let proxy_addr = spawn_proxy(cache.path()).await;

    let response = raw_request(
        proxy_addr,
        b"POST /http%3A/example.com/upload HTTP/1.1\r\n\
          Host: proxy\r\n\
          Transfer-Encoding: chunked\r\n\
          \r\n",
    )
    .await;

    assert!(
        response.starts_with("HTTP/1.1 501"),
        "unexpected response: {response}"
    );
    assert!(cache_entries(cache.path()).is_empty());
}
