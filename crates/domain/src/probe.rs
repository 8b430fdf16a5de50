use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Result of probing the isolated domain before trusting it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainVerification {
    /// The endpoint answered its health check successfully
    Verified,

    /// The probe never got an answer (transport failure or timeout)
    Unreachable { reason: String },

    /// The endpoint answered and refused
    Rejected { status: u16 },
}

impl DomainVerification {
    pub fn is_verified(&self) -> bool {
        matches!(self, DomainVerification::Verified)
    }

    /// Metric label without the detail
    pub fn label(&self) -> &'static str {
        match self {
            DomainVerification::Verified => "verified",
            DomainVerification::Unreachable { .. } => "unreachable",
            DomainVerification::Rejected { .. } => "rejected",
        }
    }
}

impl fmt::Display for DomainVerification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainVerification::Verified => write!(f, "verified"),
            DomainVerification::Unreachable { reason } => write!(f, "unreachable ({reason})"),
            DomainVerification::Rejected { status } => write!(f, "rejected (HTTP {status})"),
        }
    }
}

/// Integrity probe for a domain endpoint
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, endpoint: &str) -> DomainVerification;
}

/// `GET {endpoint}/health`, bounded by a timeout
pub struct HttpHealthProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpHealthProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, endpoint: &str) -> DomainVerification {
        let url = format!("{}/health", endpoint.trim_end_matches('/'));

        let response =
            match tokio::time::timeout(self.timeout, self.client.get(&url).send()).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    return DomainVerification::Unreachable {
                        reason: e.to_string(),
                    }
                }
                Err(_) => {
                    return DomainVerification::Unreachable {
                        reason: format!("health probe timed out after {:?}", self.timeout),
                    }
                }
            };

        let status = response.status();
        debug!(url = %url, status = %status, "Domain health probe answered");

        if status.is_success() {
            DomainVerification::Verified
        } else {
            DomainVerification::Rejected {
                status: status.as_u16(),
            }
        }
    }
}

/// Probe with a fixed answer, for tests and offline runs
pub struct StaticHealthProbe(pub DomainVerification);

#[async_trait]
impl HealthProbe for StaticHealthProbe {
    async fn probe(&self, _endpoint: &str) -> DomainVerification {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one HTTP response with the given status line
    async fn one_shot_server(status_line: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!("HTTP/1.1 {status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_probe_verified() {
        let endpoint = one_shot_server("200 OK").await;
        let probe = HttpHealthProbe::new(Duration::from_secs(5));
        assert_eq!(probe.probe(&endpoint).await, DomainVerification::Verified);
    }

    #[tokio::test]
    async fn test_probe_rejected() {
        let endpoint = one_shot_server("503 Service Unavailable").await;
        let probe = HttpHealthProbe::new(Duration::from_secs(5));
        assert_eq!(
            probe.probe(&endpoint).await,
            DomainVerification::Rejected { status: 503 }
        );
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = HttpHealthProbe::new(Duration::from_secs(5));
        let verification = probe.probe(&format!("http://{addr}")).await;
        assert!(matches!(verification, DomainVerification::Unreachable { .. }));
        assert!(!verification.is_verified());
    }

    #[test]
    fn test_display() {
        assert_eq!(DomainVerification::Verified.to_string(), "verified");
        assert_eq!(
            DomainVerification::Rejected { status: 403 }.to_string(),
            "rejected (HTTP 403)"
        );
    }
}
