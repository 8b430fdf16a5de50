use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Default slippage tolerance when the caller does not specify one (0.5%)
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

/// Upper bound for slippage tolerance (100%)
pub const MAX_SLIPPAGE_BPS: u16 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("input amount must be greater than zero")]
    ZeroAmount,

    #[error("input and output asset are the same: {mint}")]
    SameAsset { mint: Pubkey },

    #[error("slippage {bps} bps exceeds {max} bps")]
    SlippageTooHigh { bps: u16, max: u16 },
}

/// Immutable input to one swap run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    /// Identity requesting the swap, also the fee payer
    pub requester: Pubkey,

    /// Input amount in the input asset's smallest unit
    pub amount_in: u64,

    /// Minimum acceptable output in the output asset's smallest unit
    pub minimum_amount_out: u64,

    /// Asset being sold
    pub input_mint: Pubkey,

    /// Target asset
    pub output_mint: Pubkey,

    /// Slippage tolerance; `None` means [`DEFAULT_SLIPPAGE_BPS`]
    pub slippage_bps: Option<u16>,
}

impl SwapRequest {
    pub fn new(
        requester: Pubkey,
        amount_in: u64,
        minimum_amount_out: u64,
        input_mint: Pubkey,
        output_mint: Pubkey,
    ) -> Result<Self, RequestError> {
        let request = Self {
            requester,
            amount_in,
            minimum_amount_out,
            input_mint,
            output_mint,
            slippage_bps: None,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_slippage_bps(mut self, bps: u16) -> Result<Self, RequestError> {
        self.slippage_bps = Some(bps);
        self.validate()?;
        Ok(self)
    }

    /// Re-check invariants, e.g. after deserialization
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.amount_in == 0 {
            return Err(RequestError::ZeroAmount);
        }
        if self.input_mint == self.output_mint {
            return Err(RequestError::SameAsset {
                mint: self.input_mint,
            });
        }
        if let Some(bps) = self.slippage_bps {
            if bps > MAX_SLIPPAGE_BPS {
                return Err(RequestError::SlippageTooHigh {
                    bps,
                    max: MAX_SLIPPAGE_BPS,
                });
            }
        }
        Ok(())
    }

    pub fn effective_slippage_bps(&self) -> u16 {
        self.slippage_bps.unwrap_or(DEFAULT_SLIPPAGE_BPS)
    }
}
