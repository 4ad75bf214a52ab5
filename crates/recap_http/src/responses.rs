use tokio::{io::AsyncWriteExt, net::TcpStream};

/// Generic helper to send an HTTP response with a binary body.
pub async fn send_response(
    stream: &mut TcpStream,
    status: &str,
    content_type: &str,
    body: &[u8],
) -> anyhow::Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\n\
         Server: recap/0.1.0\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    );

    stream.write_all(response.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}

/// Replayed or freshly recorded response bytes, served verbatim.
/// No upstream status or headers are forwarded, only the body.
pub async fn send_cached_body(stream: &mut TcpStream, body: &[u8]) -> anyhow::Result<()> {
    send_response(stream, "200 OK", "application/octet-stream", body).await
}

/// Helper for plain-text responses.
async fn send_text_response(
    stream: &mut TcpStream,
    status: &str,
    body: &str,
) -> anyhow::Result<()> {
    send_response(stream, status, "text/plain; charset=utf-8", body.as_bytes()).await
}

pub async fn send_400(stream: &mut TcpStream) -> anyhow::Result<()> {
    send_text_response(stream, "400 Bad Request", "400 Bad Request\n").await
}

pub async fn send_405(stream: &mut TcpStream) -> anyhow::Result<()> {
    send_text_response(stream, "405 Method Not Allowed", "405 Method Not Allowed\n").await
}

pub async fn send_408(stream: &mut TcpStream) -> anyhow::Result<()> {
    send_text_response(stream, "408 Request Timeout", "408 Request Timeout\n").await
}

pub async fn send_413(stream: &mut TcpStream) -> anyhow::Result<()> {
    send_text_response(stream, "413 Payload Too Large", "413 Payload Too Large\n").await
}

pub async fn send_431(stream: &mut TcpStream) -> anyhow::Result<()> {
    send_text_response(
        stream,
        "431 Request Header Fields Too Large",
        "431 Request Header Fields Too Large\n",
    )
    .await
}

pub async fn send_500(stream: &mut TcpStream) -> anyhow::Result<()> {
    send_text_response(
        stream,
        "500 Internal Server Error",
        "Internal Server Error\n",
    )
    .await
}

pub async fn send_501(stream: &mut TcpStream) -> anyhow::Result<()> {
    send_text_response(
        stream,
        "501 Not Implemented",
        "501 Not Implemented (chunked request bodies unsupported)\n",
    )
    .await
}
