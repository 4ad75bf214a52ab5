use std::{net::SocketAddr, sync::Arc};

use bytes::{Buf, BytesMut};
use recap_config::RecapConfig;
use recap_http::responses::{
    send_400, send_405, send_408, send_413, send_431, send_500, send_501, send_cached_body,
};
use recap_proxy::Proxy;
use tokio::{
    io::AsyncReadExt,
    net::TcpStream,
    time::{Duration, timeout},
};
use tracing::{debug, error, info, instrument, warn};

/// Entry point for a "logical worker" that handles a single connection.
///
/// The mock proxy serves short-lived test traffic, so every connection
/// carries exactly one request and is closed after the response.
#[instrument(
    skip(stream, proxy, cfg),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    proxy: Arc<Proxy>,
    cfg: Arc<RecapConfig>,
) -> anyhow::Result<()> {
    debug!(target: "recap::worker", "Handling new client connection");

    let mut buf = BytesMut::new();

    // 1) Read one HTTP request head (request line + headers)
    let req = match read_http_request(&mut stream, &mut buf, &cfg).await? {
        Some(req) => req,
        None => return Ok(()),
    };

    let method = req.method.as_str();
    debug!(
        target: "recap::worker",
        %method,
        path = %req.path,
        "Parsed HTTP request line"
    );

    // 2) Drop the head from the buffer; body bytes (if any) follow it
    buf.advance(req.body_start);

    // 3) Catch-all route, but only GET and POST are meaningful to the cache.
    // Drain the declared body first so the rejection is reliably delivered
    // to a client still mid-send.
    if method != "GET" && method != "POST" {
        warn!(
            target: "recap::worker",
            %method,
            "Unsupported method; returning 405"
        );
        let _ = discard_body(&mut stream, &mut buf, req.content_length, &cfg).await;
        send_405(&mut stream).await?;
        return Ok(());
    }

    if req.is_chunked {
        warn!(
            target: "recap::worker",
            "Chunked request body unsupported; returning 501"
        );
        send_501(&mut stream).await?;
        return Ok(());
    }

    // 4) Read the full body
    let body = match read_body(&mut stream, &mut buf, req.content_length, &cfg).await? {
        Some(body) => body,
        None => return Ok(()),
    };

    let content_type = extract_content_type(&req.headers);
    let (path, query) = split_path_query(&req.path);

    // 5) Replay or record
    match proxy.serve(path, query, content_type.as_deref(), &body).await {
        Ok(bytes) => {
            send_cached_body(&mut stream, &bytes).await?;
            info!(
                target: "recap::worker",
                %method,
                %path,
                len = bytes.len(),
                "Request served"
            );
        }
        Err(e) => {
            error!(
                target: "recap::worker",
                %method,
                %path,
                error = ?e,
                "Proxy handler failed; returning 500"
            );
            send_500(&mut stream).await?;
        }
    }

    Ok(())
}

fn split_path_query(target: &str) -> (&str, &str) {
    match target.split_once('?') {
        Some((path, query)) => (path, query),
        None => (target, ""),
    }
}

fn extract_content_type(headers: &str) -> Option<String> {
    for line in headers.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if name.trim().eq_ignore_ascii_case("content-type") {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Reads a full HTTP request head:
/// - Reads until `\r\n\r\n` (end of headers)
/// - Extracts method, path and Content-Length
#[derive(Debug)]
struct ParsedRequest {
    headers: String,
    method: String,
    path: String,
    content_length: usize,
    is_chunked: bool,
    body_start: usize,
}

async fn read_http_request(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    cfg: &RecapConfig,
) -> anyhow::Result<Option<ParsedRequest>> {
    let read_timeout = Duration::from_secs(cfg.server.client_read_timeout_secs);
    let max_headers = cfg.server.max_request_headers_bytes as usize;
    let max_body = cfg.server.max_request_body_bytes as usize;

    let headers_end = loop {
        if let Some(pos) = find_headers_end(buf) {
            break pos;
        }

        if max_headers > 0 && buf.len() > max_headers {
            send_431(stream).await?;
            return Ok(None);
        }

        match read_more(stream, buf, read_timeout).await? {
            ReadOutcome::Timeout => {
                if buf.is_empty() {
                    return Ok(None);
                }
                send_408(stream).await?;
                return Ok(None);
            }
            ReadOutcome::Read(0) => return Ok(None),
            ReadOutcome::Read(_) => {}
        }
    };

    let header_bytes = &buf[..headers_end];
    let headers_str = String::from_utf8_lossy(header_bytes).to_string();

    let meta = match parse_request_metadata(&headers_str) {
        Ok(meta) => meta,
        Err(err) => {
            warn!(
                target: "recap::worker",
                error = ?err,
                "Invalid request headers"
            );
            send_400(stream).await?;
            return Ok(None);
        }
    };

    let RequestMetadata {
        method,
        path,
        mut content_length,
        is_chunked,
    } = meta;

    if is_chunked && content_length > 0 {
        warn!(
            target: "recap::worker",
            content_length,
            "Ignoring Content-Length because Transfer-Encoding is chunked"
        );
        content_length = 0;
    }

    if !is_chunked && content_length > 0 && max_body > 0 && content_length > max_body {
        send_413(stream).await?;
        return Ok(None);
    }

    Ok(Some(ParsedRequest {
        headers: headers_str,
        method,
        path,
        content_length,
        is_chunked,
        body_start: headers_end + 4,
    }))
}

/// Reads `content_length` body bytes, on top of whatever is already buffered.
async fn read_body(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    content_length: usize,
    cfg: &RecapConfig,
) -> anyhow::Result<Option<Vec<u8>>> {
    let read_timeout = Duration::from_secs(cfg.server.client_read_timeout_secs);

    while buf.len() < content_length {
        match read_more(stream, buf, read_timeout).await? {
            ReadOutcome::Timeout => {
                send_408(stream).await?;
                return Ok(None);
            }
            ReadOutcome::Read(0) => {
                anyhow::bail!("Client closed connection while sending body");
            }
            ReadOutcome::Read(_) => {}
        }
    }

    let body = buf.split_to(content_length).to_vec();
    Ok(Some(body))
}

/// Best-effort drain of a declared body ahead of a rejection response.
async fn discard_body(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    mut remaining: usize,
    cfg: &RecapConfig,
) -> anyhow::Result<()> {
    let read_timeout = Duration::from_secs(cfg.server.client_read_timeout_secs);

    while remaining > 0 {
        if !buf.is_empty() {
            let take = remaining.min(buf.len());
            buf.advance(take);
            remaining -= take;
            continue;
        }
        match read_more(stream, buf, read_timeout).await? {
            ReadOutcome::Timeout | ReadOutcome::Read(0) => break,
            ReadOutcome::Read(_) => {}
        }
    }
    Ok(())
}

fn find_headers_end(buf: &BytesMut) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

enum ReadOutcome {
    Read(usize),
    Timeout,
}

async fn read_more(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    timeout_dur: Duration,
) -> anyhow::Result<ReadOutcome> {
    let mut tmp = [0u8; 4096];
    match timeout(timeout_dur, stream.read(&mut tmp)).await {
        Ok(res) => {
            let n = res?;
            if n > 0 {
                buf.extend_from_slice(&tmp[..n]);
            }
            Ok(ReadOutcome::Read(n))
        }
        Err(_) => Ok(ReadOutcome::Timeout),
    }
}

#[derive(Debug)]
struct RequestMetadata {
    method: String,
    path: String,
    content_length: usize,
    is_chunked: bool,
}

#[derive(Debug)]
enum HeaderParseError {
    MissingRequestLine,
    InvalidContentLength,
    ConflictingContentLength,
}

#[derive(Default)]
struct ContentLengthState {
    value: Option<usize>,
    invalid: bool,
    conflict: bool,
}

impl ContentLengthState {
    fn add(&mut self, raw: &str) {
        let mut any = false;
        for part in raw.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            any = true;
            match trimmed.parse::<usize>() {
                Ok(len) => {
                    if let Some(prev) = self.value {
                        if prev != len {
                            self.conflict = true;
                            self.invalid = true;
                        }
                    } else {
                        self.value = Some(len);
                    }
                }
                Err(_) => {
                    self.invalid = true;
                }
            }
        }
        if !any {
            self.invalid = true;
        }
    }
}

fn parse_request_metadata(headers: &str) -> Result<RequestMetadata, HeaderParseError> {
    let mut lines = headers.lines();

    let request_line = lines.next().ok_or(HeaderParseError::MissingRequestLine)?;
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or(HeaderParseError::MissingRequestLine)?
        .to_string();
    let path = parts.next().unwrap_or("/").to_string();

    let mut content_length = ContentLengthState::default();
    let mut is_chunked = false;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();

        if name.eq_ignore_ascii_case("content-length") {
            content_length.add(value);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            let chunked = value.split(',').any(|token| {
                token
                    .trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .eq_ignore_ascii_case("chunked")
            });
            if chunked {
                is_chunked = true;
            }
        }
    }

    if content_length.conflict {
        return Err(HeaderParseError::ConflictingContentLength);
    }
    if content_length.invalid {
        return Err(HeaderParseError::InvalidContentLength);
    }

    Ok(RequestMetadata {
        method,
        path,
        content_length: content_length.value.unwrap_or(0),
        is_chunked,
    })
}
