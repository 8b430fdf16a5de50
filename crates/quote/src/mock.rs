use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::message::{Message, VersionedMessage};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use tee_swap_types::Quote;

use crate::jupiter::JUPITER_PROGRAM_ID;
use crate::{QuoteError, QuoteProvider, QuoteRequest};

/// Mock quote provider for testing
///
/// Quotes `amount * rate_num / rate_den` with a fixed age.
pub struct MockQuoteProvider {
    rate_num: u64,
    rate_den: u64,
    age: Duration,
    no_route: bool,
    calls: AtomicU32,
}

impl MockQuoteProvider {
    /// One-to-one rate, freshly fetched
    pub fn new() -> Self {
        Self {
            rate_num: 1,
            rate_den: 1,
            age: Duration::zero(),
            no_route: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_rate(mut self, num: u64, den: u64) -> Self {
        self.rate_num = num;
        self.rate_den = den.max(1);
        self
    }

    /// Backdate every quote by `age`
    pub fn with_age(mut self, age: Duration) -> Self {
        self.age = age;
        self
    }

    pub fn without_route(mut self) -> Self {
        self.no_route = true;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockQuoteProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        request.validate()?;

        if self.no_route {
            return Err(QuoteError::NoRouteFound {
                input: request.input_mint,
                output: request.output_mint,
            });
        }

        let out_amount =
            (request.amount as u128 * self.rate_num as u128 / self.rate_den as u128) as u64;
        let slippage_bps = request.slippage_bps();
        let threshold =
            (out_amount as u128 * (10_000 - slippage_bps.min(10_000)) as u128 / 10_000) as u64;

        Ok(Quote {
            input_mint: request.input_mint,
            output_mint: request.output_mint,
            in_amount: request.amount,
            out_amount,
            other_amount_threshold: threshold,
            slippage_bps,
            route_hops: 1,
            price_impact_pct: Decimal::ZERO,
            fetched_at: Utc::now() - self.age,
            raw: serde_json::Value::Null,
        })
    }

    async fn build_swap_transaction(
        &self,
        quote: &Quote,
        user: &Pubkey,
    ) -> Result<VersionedTransaction, QuoteError> {
        let program = Pubkey::from_str(JUPITER_PROGRAM_ID)
            .map_err(|e| QuoteError::InvalidResponse(e.to_string()))?;
        let mut data = quote.in_amount.to_le_bytes().to_vec();
        data.extend_from_slice(&quote.other_amount_threshold.to_le_bytes());

        let ix = Instruction::new_with_bytes(program, &data, vec![AccountMeta::new(*user, true)]);
        let message = Message::new_with_blockhash(&[ix], Some(user), &Hash::new_from_array([3u8; 32]));
        let signers = message.header.num_required_signatures as usize;

        Ok(VersionedTransaction {
            signatures: vec![Signature::default(); signers],
            message: VersionedMessage::Legacy(message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_rate_and_threshold() {
        let provider = MockQuoteProvider::new().with_rate(3, 2);
        let request = QuoteRequest::new(Pubkey::new_unique(), Pubkey::new_unique(), 1_000);
        let quote = provider.get_quote(&request).await.unwrap();

        assert_eq!(quote.out_amount, 1_500);
        assert_eq!(quote.other_amount_threshold, 1_492);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_without_route() {
        let provider = MockQuoteProvider::new().without_route();
        let request = QuoteRequest::new(Pubkey::new_unique(), Pubkey::new_unique(), 1_000);
        assert!(matches!(
            provider.get_quote(&request).await,
            Err(QuoteError::NoRouteFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_mock_build_transaction_is_unsigned_for_user() {
        let provider = MockQuoteProvider::new();
        let user = Pubkey::new_unique();
        let request = QuoteRequest::new(Pubkey::new_unique(), Pubkey::new_unique(), 10);
        let quote = provider.get_quote(&request).await.unwrap();

        let tx = provider.build_swap_transaction(&quote, &user).await.unwrap();
        assert_eq!(tx.message.static_account_keys()[0], user);
        assert_eq!(tx.signatures, vec![Signature::default()]);
    }
}
