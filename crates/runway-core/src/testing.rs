//! Helpers for plugin crate tests
//!
//! Enabled with the `test-util` feature.

use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve exactly one canned HTTP response on a local port
///
/// Returns the base URL (`http://127.0.0.1:<port>`) and a handle that
/// resolves to the raw request once the response has been written. The
/// request is read up to the end of its `Content-Length` body.
pub async fn serve_once(
    status: &'static str,
    body: &'static str,
) -> io::Result<(String, JoinHandle<io::Result<String>>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = socket.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);

            let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= end + 4 + length {
                break;
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await?;
        let _ = socket.shutdown().await;

        Ok(String::from_utf8_lossy(&request).into_owned())
    });

    Ok((format!("http://{}", addr), handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpStream;

    #[tokio::test]
    async fn test_serve_once_returns_request_with_body() {
        let (base, server) = serve_once("200 OK", r#"{"ok":true}"#).await.unwrap();
        let addr = base.trim_start_matches("http://");

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\n[1,2]")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with(r#"{"ok":true}"#));

        let request = server.await.unwrap().unwrap();
        assert!(request.starts_with("POST /x "));
    }
}
