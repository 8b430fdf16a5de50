use base64::Engine;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::signer::SignerError;
use std::fmt;

/// Canonical challenge proving control of `identity`
pub fn challenge_message(identity: &Pubkey) -> Vec<u8> {
    format!("auth:{identity}").into_bytes()
}

/// Produces detached signatures over arbitrary messages
///
/// Key storage stays with the caller; the domain only ever sees signatures.
pub trait MessageSigner: Send + Sync {
    fn identity(&self) -> Pubkey;

    fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError>;
}

impl MessageSigner for Keypair {
    fn identity(&self) -> Pubkey {
        self.pubkey()
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
        self.try_sign_message(message)
    }
}

/// Bearer credential for the isolated domain
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    identity: Pubkey,
    token: String,
}

impl Credential {
    /// Base64 of the 64-byte signature over [`challenge_message`]
    pub fn from_signature(identity: Pubkey, signature: &Signature) -> Self {
        Self {
            identity,
            token: base64::engine::general_purpose::STANDARD.encode(signature.as_ref()),
        }
    }

    pub fn identity(&self) -> &Pubkey {
        &self.identity
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Check the token against the identity's public key
    pub fn verify(&self) -> bool {
        let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(&self.token) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(bytes.as_slice()) else {
            return false;
        };
        signature.verify(self.identity.as_ref(), &challenge_message(&self.identity))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_format() {
        let identity = Pubkey::new_unique();
        assert_eq!(
            challenge_message(&identity),
            format!("auth:{}", identity).into_bytes()
        );
    }

    #[test]
    fn test_credential_verifies() {
        let keypair = Keypair::new();
        let signature = MessageSigner::sign_message(&keypair, &challenge_message(&keypair.pubkey()))
            .unwrap();
        let credential = Credential::from_signature(keypair.pubkey(), &signature);

        assert!(credential.verify());
        assert_eq!(
            base64::engine::general_purpose::STANDARD
                .decode(credential.token())
                .unwrap()
                .len(),
            64
        );
    }

    #[test]
    fn test_credential_for_other_identity_fails() {
        let keypair = Keypair::new();
        let signature = MessageSigner::sign_message(&keypair, &challenge_message(&keypair.pubkey()))
            .unwrap();
        let forged = Credential::from_signature(Pubkey::new_unique(), &signature);
        assert!(!forged.verify());
    }

    #[test]
    fn test_debug_redacts_token() {
        let keypair = Keypair::new();
        let signature = Signature::default();
        let credential = Credential::from_signature(keypair.pubkey(), &signature);
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(credential.token()));
    }
}
