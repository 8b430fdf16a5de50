use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

/// A priced route for converting one asset into another
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,

    /// Input amount in smallest units
    pub in_amount: u64,

    /// Expected output amount in smallest units
    pub out_amount: u64,

    /// Output floor after slippage, as reported upstream
    pub other_amount_threshold: u64,

    pub slippage_bps: u16,

    /// Number of hops in the route plan
    pub route_hops: usize,

    /// Price impact as a percentage, passed through from the provider
    pub price_impact_pct: Decimal,

    pub fetched_at: DateTime<Utc>,

    /// Upstream response, needed to build the swap transaction
    pub raw: serde_json::Value,
}

impl Quote {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// A quote fetched in the future (clock skew) is treated as fresh
    pub fn is_stale(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) > window
    }

    /// The slippage floor, not the expected output, must cover the minimum
    pub fn meets_minimum(&self, minimum_amount_out: u64) -> bool {
        self.other_amount_threshold >= minimum_amount_out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_quote(fetched_at: DateTime<Utc>) -> Quote {
        Quote {
            input_mint: Pubkey::new_unique(),
            output_mint: Pubkey::new_unique(),
            in_amount: 1_000_000_000,
            out_amount: 150_000_000,
            other_amount_threshold: 149_250_000,
            slippage_bps: 50,
            route_hops: 2,
            price_impact_pct: Decimal::new(12, 4),
            fetched_at,
            raw: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_quote_staleness_window() {
        let now = Utc::now();
        let quote = make_quote(now - Duration::seconds(45));
        assert!(quote.is_stale(now, Duration::seconds(30)));
        assert!(!quote.is_stale(now, Duration::seconds(60)));
    }

    #[test]
    fn test_quote_minimum_output() {
        let quote = make_quote(Utc::now());
        assert!(quote.meets_minimum(149_250_000));
        assert!(!quote.meets_minimum(149_250_001));
        // Expected output covers it, the slippage floor does not
        assert!(!quote.meets_minimum(150_000_000));
    }
}
