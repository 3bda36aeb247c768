//! Single-shot HTTP health probe.

use tracing::debug;

/// Outcome of one probe attempt.
///
/// Only an exact status match terminates the gate loop; everything else
/// is retried until the attempt budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeAttempt {
    /// The endpoint returned exactly the expected status.
    StatusMatch,
    /// The endpoint responded with a different status.
    StatusMismatch(u16),
    /// The connection or request failed (refused, reset, handshake).
    ConnectFailed,
}

/// Issue one GET against `http://127.0.0.1:{port}{path}`.
///
/// Success is defined solely by exact status-code equality; the body is
/// ignored. Connection errors are expected while the process is still
/// binding its port and map to `ConnectFailed`.
pub async fn http_probe(port: u16, path: &str, expect_status: u16) -> ProbeAttempt {
    let address = format!("127.0.0.1:{port}");
    let uri = format!("http://{address}{path}");

    let stream = match tokio::net::TcpStream::connect(&address).await {
        Ok(s) => s,
        Err(e) => {
            debug!(error = %e, %uri, "probe connection failed");
            return ProbeAttempt::ConnectFailed;
        }
    };

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
        Ok(pair) => pair,
        Err(e) => {
            debug!(error = %e, %uri, "probe handshake failed");
            return ProbeAttempt::ConnectFailed;
        }
    };

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = match http::Request::builder()
        .method("GET")
        .uri(&uri)
        .header("host", &address)
        .header("user-agent", "slipway-health/0.1")
        .body(http_body_util::Empty::<bytes::Bytes>::new())
    {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, %uri, "probe request build failed");
            return ProbeAttempt::ConnectFailed;
        }
    };

    match sender.send_request(req).await {
        Ok(resp) => {
            let status = resp.status().as_u16();
            if status == expect_status {
                ProbeAttempt::StatusMatch
            } else {
                debug!(status, expected = expect_status, %uri, "probe status mismatch");
                ProbeAttempt::StatusMismatch(status)
            }
        }
        Err(e) => {
            debug!(error = %e, %uri, "probe request failed");
            ProbeAttempt::ConnectFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP responder serving a fixed status on every request.
    async fn spawn_stub(status: u16) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = sock.read(&mut buf).await;
                    let resp = format!(
                        "HTTP/1.1 {status} X\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    );
                    let _ = sock.write_all(resp.as_bytes()).await;
                });
            }
        });
        port
    }

    #[tokio::test]
    async fn matching_status_is_success() {
        let port = spawn_stub(200).await;
        let attempt = http_probe(port, "/healthz", 200).await;
        assert_eq!(attempt, ProbeAttempt::StatusMatch);
    }

    #[tokio::test]
    async fn mismatched_status_is_reported() {
        let port = spawn_stub(503).await;
        let attempt = http_probe(port, "/healthz", 200).await;
        assert_eq!(attempt, ProbeAttempt::StatusMismatch(503));
    }

    #[tokio::test]
    async fn exact_match_only_no_2xx_family() {
        // 204 is 2xx but not the expected 200.
        let port = spawn_stub(204).await;
        let attempt = http_probe(port, "/healthz", 200).await;
        assert_eq!(attempt, ProbeAttempt::StatusMismatch(204));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_failed() {
        // Bind then drop to find a port with no listener.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let attempt = http_probe(port, "/healthz", 200).await;
        assert_eq!(attempt, ProbeAttempt::ConnectFailed);
    }
}
