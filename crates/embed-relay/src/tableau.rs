//! Tableau REST sign-in.
//!
//! Forwards a validated credential payload to the configured sign-in
//! endpoint. Only the status code decides the outcome; the response body is
//! logged and otherwise discarded.

use std::time::Duration;

use axum::http::{StatusCode, header};
use tableau_embed_models::TableauSignIn;
use tracing::{debug, info, warn};

use crate::error::RelayError;

/// Client for one Tableau sign-in endpoint.
#[derive(Debug, Clone)]
pub struct TableauClient {
    http: reqwest::Client,
    signin_url: String,
}

impl TableauClient {
    /// Build a client whose requests time out after `timeout`.
    pub fn new(signin_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            signin_url: signin_url.into(),
        })
    }

    /// The sign-in endpoint this client posts to.
    pub fn signin_url(&self) -> &str {
        &self.signin_url
    }

    /// Sign in to Tableau with `payload`.
    ///
    /// Makes exactly one attempt; there are no retries.
    ///
    /// # Errors
    ///
    /// * [`RelayError::EncodePayload`] if the payload cannot be serialised.
    /// * [`RelayError::TransportFailure`] on connection errors or timeouts
    ///   before Tableau's status line arrives.
    /// * [`RelayError::UpstreamAuthFailure`] carrying Tableau's status when it
    ///   is anything other than 200.
    pub async fn sign_in(&self, payload: &TableauSignIn) -> Result<(), RelayError> {
        let body = serde_json::to_vec(payload).map_err(RelayError::EncodePayload)?;

        let res = self
            .http
            .post(&self.signin_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = res.status();
        // The body is informational only; a truncated one must not change the outcome.
        match res.text().await {
            Ok(text) => debug!(%status, body = %text, "Tableau response"),
            Err(e) => warn!(%status, error = %e, "unreadable Tableau response body"),
        }

        if status != StatusCode::OK {
            warn!(%status, "Tableau authentication failed");
            return Err(RelayError::UpstreamAuthFailure(status));
        }

        info!(%status, "Tableau authentication succeeded");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    fn payload() -> TableauSignIn {
        serde_json::from_value(serde_json::json!({
            "credentials": { "name": "u", "password": "p", "site": { "contentUrl": "" } }
        }))
        .unwrap()
    }

    /// Consume one HTTP/1.1 request, headers and `Content-Length` body.
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                return;
            }
        }
    }

    /// Start a raw upstream that answers `status_line` and then closes the
    /// connection part-way through a declared 100-byte body.
    pub(crate) async fn start_truncating_upstream(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                read_request(&mut stream).await;
                let reply = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\n\
                     Content-Length: 100\r\n\r\n{{\"err"
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}/api/3.22/auth/signin")
    }

    #[test]
    fn client_keeps_url() {
        let client =
            TableauClient::new("http://127.0.0.1:9/signin", Duration::from_secs(1)).unwrap();
        assert_eq!(client.signin_url(), "http://127.0.0.1:9/signin");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_transport_failure() {
        // Bind then drop to get a loopback port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client =
            TableauClient::new(format!("http://127.0.0.1:{port}/signin"), Duration::from_secs(2))
                .unwrap();

        let err = client.sign_in(&payload()).await.unwrap_err();
        assert!(matches!(err, RelayError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn truncated_rejection_keeps_upstream_status() {
        let url = start_truncating_upstream("401 Unauthorized").await;
        let client = TableauClient::new(url, Duration::from_secs(2)).unwrap();

        let err = client.sign_in(&payload()).await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::UpstreamAuthFailure(StatusCode::UNAUTHORIZED)
        ));
    }

    #[tokio::test]
    async fn truncated_success_still_signs_in() {
        let url = start_truncating_upstream("200 OK").await;
        let client = TableauClient::new(url, Duration::from_secs(2)).unwrap();

        client.sign_in(&payload()).await.unwrap();
    }
}
