use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcError;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Ledger error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    /// The endpoint could not be reached at all
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    /// The ledger accepted the request but refused the transaction
    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl LedgerError {
    /// True when the failure says nothing about the transaction itself
    pub fn is_unavailable(&self) -> bool {
        matches!(self, LedgerError::Unavailable(_) | LedgerError::Timeout(_))
    }
}

impl From<ClientError> for LedgerError {
    fn from(err: ClientError) -> Self {
        match err.kind() {
            ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => {
                LedgerError::Unavailable(err.to_string())
            }
            ClientErrorKind::RpcError(RpcError::RpcResponseError { .. })
            | ClientErrorKind::TransactionError(_) => LedgerError::Rejected(err.to_string()),
            _ => LedgerError::QueryFailed(err.to_string()),
        }
    }
}

/// Status of a submitted signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureState {
    /// Not yet visible at the configured commitment
    Pending,
    Confirmed,
    /// Landed but the transaction itself failed
    Failed(String),
}

/// Ledger client trait for submitting and observing transactions
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Endpoint this client talks to, for logs and journals
    fn endpoint(&self) -> &str;

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError>;

    /// Hand a signed transaction to the ledger
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError>;

    /// Hand a signed versioned (address-table capable) transaction to the ledger
    async fn send_versioned_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, LedgerError>;

    async fn signature_status(&self, signature: &Signature)
        -> Result<SignatureState, LedgerError>;

    /// Owning program of an account, `None` when the account does not exist
    async fn account_owner(&self, address: &Pubkey) -> Result<Option<Pubkey>, LedgerError>;

    /// Raw account data, `None` when the account does not exist
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError>;
}

/// Connection settings for an RPC endpoint
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub request_timeout: Duration,
}

impl LedgerClientConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            commitment: CommitmentConfig::confirmed(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Parse a commitment name (processed, confirmed, finalized)
    pub fn with_commitment(mut self, commitment: &str) -> Result<Self, LedgerError> {
        let level = CommitmentLevel::from_str(commitment).map_err(|_| {
            LedgerError::InvalidConfig(format!("unknown commitment '{commitment}'"))
        })?;
        self.commitment = CommitmentConfig { commitment: level };
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for LedgerClientConfig {
    fn default() -> Self {
        Self::new("http://127.0.0.1:8899")
    }
}

/// JSON-RPC ledger client
pub struct RpcLedgerClient {
    config: LedgerClientConfig,
    rpc_client: RpcClient,
    connected: Arc<RwLock<bool>>,
}

impl RpcLedgerClient {
    /// Create a client without touching the network
    pub fn new(config: LedgerClientConfig) -> Self {
        let rpc_client = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.request_timeout,
            config.commitment,
        );

        Self {
            config,
            rpc_client,
            connected: Arc::new(RwLock::new(false)),
        }
    }

    /// Create a client and verify the endpoint answers
    pub async fn connect(config: LedgerClientConfig) -> Result<Self, LedgerError> {
        let client = Self::new(config);
        client.test_connection().await?;
        Ok(client)
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.read().await
    }

    /// Test connection to the endpoint
    pub async fn test_connection(&self) -> Result<(), LedgerError> {
        match tokio::time::timeout(self.config.request_timeout, self.rpc_client.get_version())
            .await
        {
            Ok(Ok(version)) => {
                *self.connected.write().await = true;
                tracing::debug!(
                    rpc_url = %self.config.rpc_url,
                    version = %version.solana_core,
                    "Ledger endpoint reachable"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                *self.connected.write().await = false;
                Err(LedgerError::Unavailable(format!(
                    "Connection test failed: {}",
                    e
                )))
            }
            Err(_) => {
                *self.connected.write().await = false;
                Err(LedgerError::Timeout(format!(
                    "Connection test timed out after {:?}",
                    self.config.request_timeout
                )))
            }
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    fn endpoint(&self) -> &str {
        &self.config.rpc_url
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        self.rpc_client
            .get_latest_blockhash()
            .await
            .map_err(LedgerError::from)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        let result = self.rpc_client.send_transaction(tx).await;
        if let Err(e) = &result {
            tracing::debug!(rpc_url = %self.config.rpc_url, error = %e, "send_transaction failed");
        }
        result.map_err(LedgerError::from)
    }

    async fn send_versioned_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, LedgerError> {
        let result = self.rpc_client.send_transaction(tx).await;
        if let Err(e) = &result {
            tracing::debug!(
                rpc_url = %self.config.rpc_url,
                error = %e,
                "send_transaction (versioned) failed"
            );
        }
        result.map_err(LedgerError::from)
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureState, LedgerError> {
        let status = self.rpc_client.get_signature_status(signature).await?;
        Ok(match status {
            None => SignatureState::Pending,
            Some(Ok(())) => SignatureState::Confirmed,
            Some(Err(e)) => SignatureState::Failed(e.to_string()),
        })
    }

    async fn account_owner(&self, address: &Pubkey) -> Result<Option<Pubkey>, LedgerError> {
        let response = self
            .rpc_client
            .get_account_with_commitment(address, self.config.commitment)
            .await?;
        Ok(response.value.map(|account| account.owner))
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        let response = self
            .rpc_client
            .get_account_with_commitment(address, self.config.commitment)
            .await?;
        Ok(response.value.map(|account| account.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LedgerClientConfig::new("https://api.devnet.solana.com");
        assert_eq!(config.commitment, CommitmentConfig::confirmed());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_commitment_parsing() {
        let config = LedgerClientConfig::default()
            .with_commitment("finalized")
            .unwrap();
        assert_eq!(config.commitment, CommitmentConfig::finalized());

        assert!(matches!(
            LedgerClientConfig::default().with_commitment("eventually"),
            Err(LedgerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unavailable_classification() {
        assert!(LedgerError::Unavailable("down".into()).is_unavailable());
        assert!(LedgerError::Timeout("slow".into()).is_unavailable());
        assert!(!LedgerError::Rejected("bad".into()).is_unavailable());
    }

    #[tokio::test]
    async fn test_client_starts_disconnected() {
        let client = RpcLedgerClient::new(LedgerClientConfig::default());
        assert!(!client.is_connected().await);
        assert_eq!(client.endpoint(), "http://127.0.0.1:8899");
    }

    #[tokio::test]
    #[ignore] // Requires a reachable RPC endpoint
    async fn test_connect_devnet() {
        let client = RpcLedgerClient::connect(LedgerClientConfig::new(
            "https://api.devnet.solana.com",
        ))
        .await
        .unwrap();
        assert!(client.is_connected().await);
        assert!(client.latest_blockhash().await.is_ok());
    }
}
