use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::transaction::VersionedTransaction;
use std::str::FromStr;
use std::time::Duration;
use tee_swap_types::{Quote, DEFAULT_SLIPPAGE_BPS};
use tracing::{debug, info, warn};

use crate::{QuoteError, QuoteProvider, QuoteRequest};

pub const DEFAULT_JUPITER_URL: &str = "https://quote-api.jup.ag/v6";

/// Jupiter v6 aggregator program
pub const JUPITER_PROGRAM_ID: &str = "JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4";

/// Priority fee attached to built swap transactions
const COMPUTE_UNIT_PRICE_MICRO_LAMPORTS: u64 = 1_000_000;

/// Jupiter aggregator client
pub struct JupiterClient {
    base_url: String,
    client: reqwest::Client,
    default_slippage_bps: u16,
}

impl JupiterClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }

    /// Create client for the public API
    pub fn mainnet() -> Self {
        Self::new(DEFAULT_JUPITER_URL)
    }

    /// Create client with a bounded request timeout
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::RequestFailed(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
        })
    }

    pub fn with_default_slippage_bps(mut self, slippage_bps: u16) -> Self {
        self.default_slippage_bps = slippage_bps;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    input_mint: String,
    in_amount: String,
    output_mint: String,
    out_amount: String,
    other_amount_threshold: String,
    slippage_bps: u16,
    #[serde(default)]
    price_impact_pct: Option<String>,
    #[serde(default)]
    route_plan: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(default)]
    error_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapRequestBody<'a> {
    quote_response: &'a serde_json::Value,
    user_public_key: String,
    wrap_and_unwrap_sol: bool,
    compute_unit_price_micro_lamports: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
}

fn parse_amount(field: &str, value: &str) -> Result<u64, QuoteError> {
    value
        .parse::<u64>()
        .map_err(|e| QuoteError::InvalidResponse(format!("invalid {field} '{value}': {e}")))
}

fn parse_mint(field: &str, value: &str) -> Result<Pubkey, QuoteError> {
    Pubkey::from_str(value)
        .map_err(|e| QuoteError::InvalidResponse(format!("invalid {field} '{value}': {e}")))
}

fn is_no_route(error: &ErrorResponse) -> bool {
    error
        .error_code
        .as_deref()
        .map(|code| code.contains("ROUTE"))
        .unwrap_or(false)
        || error.error.to_lowercase().contains("route")
}

/// Base64 wire bytes of the unsigned swap transaction
fn decode_swap_transaction(encoded: &str) -> Result<VersionedTransaction, QuoteError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| QuoteError::InvalidResponse(format!("invalid swapTransaction: {}", e)))?;
    bincode::deserialize(&bytes).map_err(|e| {
        QuoteError::InvalidResponse(format!("undecodable swapTransaction: {}", e))
    })
}

/// Convert a raw quote response into a [`Quote`], keeping the raw value
pub(crate) fn parse_quote(
    request: &QuoteRequest,
    raw: serde_json::Value,
) -> Result<Quote, QuoteError> {
    let parsed: QuoteResponse = serde_json::from_value(raw.clone())
        .map_err(|e| QuoteError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    if parsed.route_plan.is_empty() {
        return Err(QuoteError::NoRouteFound {
            input: request.input_mint,
            output: request.output_mint,
        });
    }

    let price_impact_pct = match parsed.price_impact_pct.as_deref() {
        Some(value) => Decimal::from_str(value).map_err(|e| {
            QuoteError::InvalidResponse(format!("invalid priceImpactPct '{value}': {e}"))
        })?,
        None => Decimal::ZERO,
    };

    Ok(Quote {
        input_mint: parse_mint("inputMint", &parsed.input_mint)?,
        output_mint: parse_mint("outputMint", &parsed.output_mint)?,
        in_amount: parse_amount("inAmount", &parsed.in_amount)?,
        out_amount: parse_amount("outAmount", &parsed.out_amount)?,
        other_amount_threshold: parse_amount(
            "otherAmountThreshold",
            &parsed.other_amount_threshold,
        )?,
        slippage_bps: parsed.slippage_bps,
        route_hops: parsed.route_plan.len(),
        price_impact_pct,
        fetched_at: Utc::now(),
        raw,
    })
}

#[async_trait]
impl QuoteProvider for JupiterClient {
    async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, QuoteError> {
        request.validate()?;

        let slippage_bps = request.slippage_bps.unwrap_or(self.default_slippage_bps);
        let url = format!("{}/quote", self.base_url);
        let query = [
            ("inputMint", request.input_mint.to_string()),
            ("outputMint", request.output_mint.to_string()),
            ("amount", request.amount.to_string()),
            ("slippageBps", slippage_bps.to_string()),
            ("onlyDirectRoutes", "false".to_string()),
            ("asLegacyTransaction", "false".to_string()),
        ];

        debug!(url = %url, amount = request.amount, slippage_bps, "Querying Jupiter quote");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| QuoteError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if let Ok(error) = serde_json::from_str::<ErrorResponse>(&body) {
                if is_no_route(&error) {
                    return Err(QuoteError::NoRouteFound {
                        input: request.input_mint,
                        output: request.output_mint,
                    });
                }
            }
            warn!(status = %status, body = %body, "Jupiter quote API error");
            return Err(QuoteError::RequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| QuoteError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let quote = parse_quote(request, raw)?;

        info!(
            in_amount = quote.in_amount,
            out_amount = quote.out_amount,
            price_impact_pct = %quote.price_impact_pct,
            route_hops = quote.route_hops,
            "Jupiter quote"
        );

        Ok(quote)
    }

    async fn build_swap_transaction(
        &self,
        quote: &Quote,
        user: &Pubkey,
    ) -> Result<VersionedTransaction, QuoteError> {
        let url = format!("{}/swap", self.base_url);
        let body = SwapRequestBody {
            quote_response: &quote.raw,
            user_public_key: user.to_string(),
            wrap_and_unwrap_sol: true,
            compute_unit_price_micro_lamports: COMPUTE_UNIT_PRICE_MICRO_LAMPORTS,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| QuoteError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Jupiter swap API error");
            return Err(QuoteError::RequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let swap: SwapResponse = response
            .json()
            .await
            .map_err(|e| QuoteError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        decode_swap_transaction(&swap.swap_transaction)
    }
}
