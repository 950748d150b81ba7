//! HTTP plumbing shared by the providers: deadlines and error mapping.

use docqa_core::{AppError, AppResult};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

/// Run a whole request/response exchange under a deadline.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, exchange: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, exchange).await {
        Ok(result) => result,
        Err(_) => Err(AppError::GenerationTimeout(deadline)),
    }
}

/// Map a reqwest failure onto the error taxonomy.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error, deadline: Duration) -> AppError {
    if err.is_timeout() {
        AppError::GenerationTimeout(deadline)
    } else if err.is_decode() {
        AppError::Llm(format!("Failed to parse {} response: {}", provider, err))
    } else {
        AppError::BackendUnavailable(format!("Failed to reach {}: {}", provider, err))
    }
}

/// Pass successful responses through; turn the rest into typed errors.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> AppResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = parse_retry_after(response.headers());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(status_error(provider, status, retry_after, &body))
}

pub(crate) fn status_error(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    body: &str,
) -> AppError {
    match status.as_u16() {
        429 => AppError::RateLimited {
            message: format!("{} API error ({}): {}", provider, status, body.trim()),
            retry_after,
        },
        // 529 is Anthropic's "overloaded"
        500..=599 => AppError::BackendUnavailable(format!(
            "{} API error ({}): {}",
            provider,
            status,
            body.trim()
        )),
        _ => AppError::Llm(format!("{} API error ({}): {}", provider, status, body.trim())),
    }
}

/// Parse a `retry-after` header given in seconds.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

#[cfg(test)]
pub(crate) mod test_support {
    //! One-shot local HTTP servers for exercising the providers.

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `response` verbatim to the first connection, return the base URL.
    pub(crate) async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    /// Accept a connection, read the request, and never answer.
    pub(crate) async fn serve_silent() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            drop(socket);
        });
        format!("http://{}", addr)
    }

    /// Base URL of a port nobody listens on.
    pub(crate) async fn unreachable() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    pub(crate) fn http_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut response = format!("HTTP/1.1 {}\r\n", status_line);
        for (name, value) in headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str("content-type: application/json\r\n");
        response.push_str(&format!("content-length: {}\r\n", body.len()));
        response.push_str("connection: close\r\n\r\n");
        response.push_str(body);
        response
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            buf.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = find_header_end(&buf) {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    return;
                }
            }
        }
    }

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_status_mapping() {
        let err = status_error("ollama", StatusCode::TOO_MANY_REQUESTS, None, "busy");
        assert!(matches!(err, AppError::RateLimited { retry_after: None, .. }));

        let err = status_error("anthropic", StatusCode::from_u16(529).unwrap(), None, "");
        assert!(matches!(err, AppError::BackendUnavailable(_)));

        let err = status_error("ollama", StatusCode::NOT_FOUND, None, "model not found");
        match err {
            AppError::Llm(msg) => assert!(msg.contains("model not found")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("1.5"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_millis(1500)));

        // Out of range for Duration
        headers.insert(RETRY_AFTER, HeaderValue::from_static("1e20"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("-2.5"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let deadline = Duration::from_millis(20);
        let result: AppResult<()> = with_deadline(deadline, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(AppError::GenerationTimeout(d)) if d == deadline));
    }
}
