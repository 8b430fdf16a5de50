use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use tee_swap_types::{Quote, SwapRequest, DEFAULT_SLIPPAGE_BPS};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum QuoteError {
    #[error("quote amount must be greater than zero")]
    InvalidAmount,

    #[error("no route found from {input} to {output}")]
    NoRouteFound { input: Pubkey, output: Pubkey },

    #[error("quote request failed: {0}")]
    RequestFailed(String),

    #[error("invalid quote response: {0}")]
    InvalidResponse(String),
}

/// Parameters for a single route quote
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount: u64,
    pub slippage_bps: Option<u16>,
}

impl QuoteRequest {
    pub fn new(input_mint: Pubkey, output_mint: Pubkey, amount: u64) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            slippage_bps: None,
        }
    }

    pub fn with_slippage_bps(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = Some(slippage_bps);
        self
    }

    pub fn slippage_bps(&self) -> u16 {
        self.slippage_bps.unwrap_or(DEFAULT_SLIPPAGE_BPS)
    }

    pub fn validate(&self) -> Result<(), QuoteError> {
        if self.amount == 0 {
            return Err(QuoteError::InvalidAmount);
        }
        Ok(())
    }
}

impl From<&SwapRequest> for QuoteRequest {
    fn from(request: &SwapRequest) -> Self {
        Self {
            input_mint: request.input_mint,
            output_mint: request.output_mint,
            amount: request.amount_in,
            slippage_bps: request.slippage_bps,
        }
    }
}

/// Source of priced routes
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Best route for the request; price is passed through as reported
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, QuoteError>;

    /// Unsigned transaction executing `quote` with `user` as fee payer
    async fn build_swap_transaction(
        &self,
        quote: &Quote,
        user: &Pubkey,
    ) -> Result<VersionedTransaction, QuoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_slippage() {
        let request = QuoteRequest::new(Pubkey::new_unique(), Pubkey::new_unique(), 1_000);
        assert_eq!(request.slippage_bps(), 50);
        assert_eq!(request.with_slippage_bps(100).slippage_bps(), 100);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let request = QuoteRequest::new(Pubkey::new_unique(), Pubkey::new_unique(), 0);
        assert!(matches!(request.validate(), Err(QuoteError::InvalidAmount)));
    }
}
