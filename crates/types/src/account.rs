use sha2::{Digest, Sha256};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Domain-separation seed for swap account derivation
pub const SWAP_SEED: &[u8] = b"swap";

/// Validator identity of the isolated execution domain
pub const TEE_VALIDATOR: &str = "FnE6VJT5QNZdedZPnCoLsARgBwoE6DeJNjBs2H1gySXA";

/// Program that owns accounts while they are delegated
pub const DELEGATION_PROGRAM_ID: &str = "DELeGGvXpWV2fqJUhqcF5ZSYMS4JTLjteaAMARRSaeSh";

/// Derive the swap account address for `owner`.
///
/// Uses the ledger's program-derived-address search over
/// `[SWAP_SEED, owner]`, so any client can locate an owner's record without
/// prior on-ledger allocation.
pub fn derive_swap_address(owner: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SWAP_SEED, owner.as_ref()], program_id)
}

/// First 8 bytes of `sha256("<namespace>:<name>")`
fn discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();

    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Instruction selector for a program method
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    discriminator("global", name)
}

pub fn account_discriminator(name: &str) -> [u8; 8] {
    discriminator("account", name)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("account data too short: {len} bytes, need {need}")]
    TooShort { len: usize, need: usize },

    #[error("account discriminator mismatch")]
    WrongDiscriminator,

    #[error("unknown status byte {0}")]
    UnknownStatus(u8),
}

/// Status byte as stored on the ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountStatus {
    Pending = 0,
    Executed = 1,
    Finalized = 2,
}

impl TryFrom<u8> for AccountStatus {
    type Error = AccountError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AccountStatus::Pending),
            1 => Ok(AccountStatus::Executed),
            2 => Ok(AccountStatus::Finalized),
            other => Err(AccountError::UnknownStatus(other)),
        }
    }
}

/// On-ledger layout of the swap account
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapAccount {
    pub user: Pubkey,
    pub amount_in: u64,
    pub minimum_amount_out: u64,
    pub status: AccountStatus,
    pub executed_at: i64,
    pub bump: u8,
}

impl SwapAccount {
    /// Serialized size without the 8-byte discriminator
    pub const LEN: usize = 32 + 8 + 8 + 1 + 8 + 1;

    pub fn discriminator() -> [u8; 8] {
        account_discriminator("Swap")
    }

    pub fn decode(data: &[u8]) -> Result<Self, AccountError> {
        let need = 8 + Self::LEN;
        if data.len() < need {
            return Err(AccountError::TooShort {
                len: data.len(),
                need,
            });
        }
        if data[..8] != Self::discriminator() {
            return Err(AccountError::WrongDiscriminator);
        }

        let body = &data[8..];
        let user = Pubkey::try_from(&body[0..32]).map_err(|_| AccountError::TooShort {
            len: data.len(),
            need,
        })?;
        let amount_in = u64::from_le_bytes(read_8(&body[32..40]));
        let minimum_amount_out = u64::from_le_bytes(read_8(&body[40..48]));
        let status = AccountStatus::try_from(body[48])?;
        let executed_at = i64::from_le_bytes(read_8(&body[49..57]));
        let bump = body[57];

        Ok(Self {
            user,
            amount_in,
            minimum_amount_out,
            status,
            executed_at,
            bump,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + Self::LEN);
        out.extend_from_slice(&Self::discriminator());
        out.extend_from_slice(self.user.as_ref());
        out.extend_from_slice(&self.amount_in.to_le_bytes());
        out.extend_from_slice(&self.minimum_amount_out.to_le_bytes());
        out.push(self.status as u8);
        out.extend_from_slice(&self.executed_at.to_le_bytes());
        out.push(self.bump);
        out
    }
}

fn read_8(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_derived_address_is_deterministic() {
        let owner = Pubkey::new_unique();
        let other = Pubkey::new_unique();
        let program = Pubkey::new_unique();

        let first = derive_swap_address(&owner, &program);
        let _ = derive_swap_address(&other, &program);
        let second = derive_swap_address(&owner, &program);

        assert_eq!(first, second);
        assert_ne!(first.0, derive_swap_address(&other, &program).0);
    }

    #[test]
    fn test_derived_address_matches_manual_seeds() {
        let owner = Pubkey::new_unique();
        let program = Pubkey::new_unique();
        let (address, bump) = derive_swap_address(&owner, &program);
        let recreated =
            Pubkey::create_program_address(&[SWAP_SEED, owner.as_ref(), &[bump]], &program)
                .unwrap();
        assert_eq!(address, recreated);
    }

    #[test]
    fn test_constants_are_valid_pubkeys() {
        assert!(Pubkey::from_str(TEE_VALIDATOR).is_ok());
        assert!(Pubkey::from_str(DELEGATION_PROGRAM_ID).is_ok());
    }

    #[test]
    fn test_swap_account_layout() {
        let account = SwapAccount {
            user: Pubkey::new_unique(),
            amount_in: 1_500_000_000,
            minimum_amount_out: 42,
            status: AccountStatus::Executed,
            executed_at: 1_700_000_000,
            bump: 254,
        };
        let bytes = account.encode();
        assert_eq!(bytes.len(), 8 + SwapAccount::LEN);
        assert_eq!(bytes[8 + 48], 1);
        assert_eq!(SwapAccount::decode(&bytes).unwrap(), account);
    }

    #[test]
    fn test_swap_account_decode_errors() {
        assert!(matches!(
            SwapAccount::decode(&[0u8; 10]),
            Err(AccountError::TooShort { .. })
        ));

        let mut bytes = vec![0u8; 8 + SwapAccount::LEN];
        assert_eq!(
            SwapAccount::decode(&bytes),
            Err(AccountError::WrongDiscriminator)
        );

        bytes[..8].copy_from_slice(&SwapAccount::discriminator());
        bytes[8 + 48] = 7;
        assert_eq!(
            SwapAccount::decode(&bytes),
            Err(AccountError::UnknownStatus(7))
        );
    }

    #[test]
    fn test_instruction_discriminators_differ() {
        assert_ne!(
            instruction_discriminator("initialize_swap"),
            instruction_discriminator("execute_swap")
        );
    }
}
