use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::SignerError;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tee_swap_ledger::LedgerError;
use tee_swap_types::TEE_VALIDATOR;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    challenge_message, ChannelOpener, Credential, DomainChannel, DomainVerification, HealthProbe,
    HttpHealthProbe, MessageSigner, RpcChannelOpener,
};

pub const DEFAULT_DOMAIN_ENDPOINT: &str = "https://tee.magicblock.app";

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("domain {endpoint} is not trusted: {verification}")]
    DomainUntrusted {
        endpoint: String,
        verification: DomainVerification,
    },

    #[error("signer identity {actual} does not match requested identity {expected}")]
    IdentityMismatch { expected: Pubkey, actual: Pubkey },

    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport error: {0}")]
    Transport(#[from] LedgerError),
}

/// Whether an unverified domain may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationPolicy {
    /// Only a verified domain proceeds
    Strict,

    /// An unreachable probe proceeds and is recorded on the channel;
    /// an explicit rejection never proceeds
    AllowUnverified,
}

impl VerificationPolicy {
    pub fn admits(&self, verification: &DomainVerification) -> bool {
        match (self, verification) {
            (_, DomainVerification::Verified) => true,
            (VerificationPolicy::AllowUnverified, DomainVerification::Unreachable { .. }) => true,
            _ => false,
        }
    }
}

/// Where the domain lives and how much to trust it
#[derive(Debug, Clone)]
pub struct DomainSettings {
    pub endpoint: String,
    pub validator: Pubkey,
    pub policy: VerificationPolicy,
    pub probe_timeout: Duration,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DOMAIN_ENDPOINT.to_string(),
            validator: Pubkey::from_str(TEE_VALIDATOR).unwrap_or_default(),
            policy: VerificationPolicy::Strict,
            probe_timeout: Duration::from_secs(5),
        }
    }
}

/// Verifies, authenticates against and connects to the isolated domain
pub struct ConnectionManager {
    settings: DomainSettings,
    probe: Arc<dyn HealthProbe>,
    opener: Arc<dyn ChannelOpener>,
}

impl ConnectionManager {
    /// Manager using the HTTP health probe and the JSON-RPC transport
    pub fn new(settings: DomainSettings) -> Self {
        let probe = Arc::new(HttpHealthProbe::new(settings.probe_timeout));
        Self {
            settings,
            probe,
            opener: Arc::new(RpcChannelOpener::default()),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn ChannelOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn settings(&self) -> &DomainSettings {
        &self.settings
    }

    /// Probe the endpoint's integrity
    pub async fn verify(&self, endpoint: &str) -> DomainVerification {
        let verification = self.probe.probe(endpoint).await;
        info!(endpoint = %endpoint, verification = %verification, "Domain verification");
        verification
    }

    /// Sign the canonical challenge for `identity`; no network round trip
    pub fn authenticate(
        &self,
        identity: &Pubkey,
        signer: &dyn MessageSigner,
    ) -> Result<Credential, ConnectionError> {
        let actual = signer.identity();
        if actual != *identity {
            return Err(ConnectionError::IdentityMismatch {
                expected: *identity,
                actual,
            });
        }

        let signature = signer.sign_message(&challenge_message(identity))?;
        Ok(Credential::from_signature(*identity, &signature))
    }

    /// Verify, apply the policy, authenticate and open the channel
    pub async fn establish(
        &self,
        identity: &Pubkey,
        signer: &dyn MessageSigner,
    ) -> Result<DomainChannel, ConnectionError> {
        let endpoint = self.settings.endpoint.as_str();
        let verification = self.verify(endpoint).await;

        if !self.settings.policy.admits(&verification) {
            return Err(ConnectionError::DomainUntrusted {
                endpoint: endpoint.to_string(),
                verification,
            });
        }
        if !verification.is_verified() {
            warn!(
                endpoint = %endpoint,
                verification = %verification,
                "Proceeding with an unverified domain"
            );
        }

        let credential = self.authenticate(identity, signer)?;
        let client = self.opener.open(endpoint, &credential)?;

        info!(
            endpoint = %endpoint,
            identity = %identity,
            validator = %self.settings.validator,
            verified = verification.is_verified(),
            "Domain channel established"
        );

        Ok(DomainChannel {
            endpoint: endpoint.to_string(),
            verification,
            credential,
            validator: self.settings.validator,
            client,
        })
    }

    /// Fill `slot` if it is empty; an existing channel is reused as is
    pub async fn ensure_channel<'a>(
        &self,
        slot: &'a mut Option<DomainChannel>,
        identity: &Pubkey,
        signer: &dyn MessageSigner,
    ) -> Result<&'a DomainChannel, ConnectionError> {
        let channel = match slot.take() {
            Some(channel) => channel,
            None => self.establish(identity, signer).await?,
        };
        Ok(slot.insert(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StaticChannelOpener, StaticHealthProbe};
    use solana_sdk::signature::{Keypair, Signer};
    use tee_swap_ledger::MockLedgerClient;

    fn manager(policy: VerificationPolicy, verification: DomainVerification) -> ConnectionManager {
        let settings = DomainSettings {
            endpoint: "mock://domain".to_string(),
            policy,
            ..Default::default()
        };
        ConnectionManager::new(settings)
            .with_probe(Arc::new(StaticHealthProbe(verification)))
            .with_opener(Arc::new(StaticChannelOpener(Arc::new(MockLedgerClient::new(
                "mock://domain",
            )))))
    }

    fn unreachable() -> DomainVerification {
        DomainVerification::Unreachable {
            reason: "connection refused".to_string(),
        }
    }

    #[tokio::test]
    async fn test_strict_policy_requires_verification() {
        let keypair = Keypair::new();

        let ok = manager(VerificationPolicy::Strict, DomainVerification::Verified)
            .establish(&keypair.pubkey(), &keypair)
            .await
            .unwrap();
        assert!(ok.is_verified());
        assert!(ok.credential.verify());

        let err = manager(VerificationPolicy::Strict, unreachable())
            .establish(&keypair.pubkey(), &keypair)
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::DomainUntrusted { .. }));
    }

    #[tokio::test]
    async fn test_allow_unverified_records_assumption() {
        let keypair = Keypair::new();
        let channel = manager(VerificationPolicy::AllowUnverified, unreachable())
            .establish(&keypair.pubkey(), &keypair)
            .await
            .unwrap();

        assert!(!channel.is_verified());
        assert_eq!(channel.verification, unreachable());
    }

    #[tokio::test]
    async fn test_rejection_never_proceeds() {
        let keypair = Keypair::new();
        let err = manager(
            VerificationPolicy::AllowUnverified,
            DomainVerification::Rejected { status: 403 },
        )
        .establish(&keypair.pubkey(), &keypair)
        .await
        .unwrap_err();

        match err {
            ConnectionError::DomainUntrusted { verification, .. } => {
                assert_eq!(verification, DomainVerification::Rejected { status: 403 });
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_authenticate_identity_mismatch() {
        let keypair = Keypair::new();
        let other = Pubkey::new_unique();
        let err = manager(VerificationPolicy::Strict, DomainVerification::Verified)
            .authenticate(&other, &keypair)
            .unwrap_err();
        assert!(matches!(err, ConnectionError::IdentityMismatch { .. }));
    }

    #[tokio::test]
    async fn test_ensure_channel_reuses_existing() {
        let keypair = Keypair::new();
        let strict = manager(VerificationPolicy::Strict, DomainVerification::Verified);
        let mut slot = None;

        let first = strict
            .ensure_channel(&mut slot, &keypair.pubkey(), &keypair)
            .await
            .unwrap()
            .credential
            .clone();

        // A failing manager proves the second call does not reconnect
        let failing = manager(VerificationPolicy::Strict, unreachable());
        let second = failing
            .ensure_channel(&mut slot, &keypair.pubkey(), &keypair)
            .await
            .unwrap();
        assert_eq!(second.credential, first);
    }
}
