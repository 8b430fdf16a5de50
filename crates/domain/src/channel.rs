use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tee_swap_ledger::{LedgerClient, LedgerClientConfig, RpcLedgerClient};

use crate::{ConnectionError, Credential, DomainVerification};

/// Authenticated, run-scoped link to the isolated domain
pub struct DomainChannel {
    pub endpoint: String,
    pub verification: DomainVerification,
    pub credential: Credential,
    /// Validator the swap account is delegated to
    pub validator: Pubkey,
    pub client: Arc<dyn LedgerClient>,
}

impl DomainChannel {
    /// False when the channel was opened on an unverified endpoint
    pub fn is_verified(&self) -> bool {
        self.verification.is_verified()
    }

    pub fn client(&self) -> &dyn LedgerClient {
        self.client.as_ref()
    }
}

impl fmt::Debug for DomainChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainChannel")
            .field("endpoint", &self.endpoint)
            .field("verification", &self.verification)
            .field("credential", &self.credential)
            .field("validator", &self.validator)
            .finish_non_exhaustive()
    }
}

/// Opens the transport behind a channel
pub trait ChannelOpener: Send + Sync {
    fn open(
        &self,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<Arc<dyn LedgerClient>, ConnectionError>;
}

/// JSON-RPC transport with the credential passed as `token` query parameter
pub struct RpcChannelOpener {
    commitment: String,
    request_timeout: Duration,
}

impl RpcChannelOpener {
    pub fn new(commitment: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            commitment: commitment.into(),
            request_timeout,
        }
    }

    /// Endpoint URL with the credential attached
    pub fn authenticated_url(
        endpoint: &str,
        credential: &Credential,
    ) -> Result<String, ConnectionError> {
        let url = reqwest::Url::parse_with_params(endpoint, &[("token", credential.token())])
            .map_err(|e| ConnectionError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        Ok(url.to_string())
    }
}

impl Default for RpcChannelOpener {
    fn default() -> Self {
        Self::new("confirmed", Duration::from_secs(10))
    }
}

impl ChannelOpener for RpcChannelOpener {
    fn open(
        &self,
        endpoint: &str,
        credential: &Credential,
    ) -> Result<Arc<dyn LedgerClient>, ConnectionError> {
        let config = LedgerClientConfig::new(Self::authenticated_url(endpoint, credential)?)
            .with_commitment(&self.commitment)?
            .with_request_timeout(self.request_timeout);

        Ok(Arc::new(RpcLedgerClient::new(config)))
    }
}

/// Hands out a pre-built client, for tests and offline runs
pub struct StaticChannelOpener(pub Arc<dyn LedgerClient>);

impl ChannelOpener for StaticChannelOpener {
    fn open(
        &self,
        _endpoint: &str,
        _credential: &Credential,
    ) -> Result<Arc<dyn LedgerClient>, ConnectionError> {
        Ok(self.0.clone())
    }
}
