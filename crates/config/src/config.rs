//! Core configuration structures for the private swap saga

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Network configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Public ledger connection
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Isolated execution domain
    #[serde(default)]
    pub domain: DomainConfig,

    /// Submission retry and confirmation settings
    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Delegation confirmation polling
    #[serde(default)]
    pub delegation: DelegationConfig,

    /// Route quote provider
    #[serde(default)]
    pub quote: QuoteConfig,

    /// Risk screening collaborator
    #[serde(default)]
    pub compliance: ComplianceConfig,
}

/// Network environment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, devnet, local)
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default = "default_true")]
    pub json_logs: bool,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Devnet,
    Local,
}

/// Public ledger RPC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// JSON-RPC endpoint URL
    #[serde(default = "default_ledger_rpc_url")]
    pub rpc_url: String,

    /// Swap program id (base58)
    #[serde(default = "default_program_id")]
    pub program_id: String,

    /// Commitment level used for confirmation (processed, confirmed, finalized)
    #[serde(default = "default_commitment")]
    pub commitment: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Verification policy for the isolated domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Only a verified domain may be used
    Strict,

    /// An unreachable probe is tolerated and recorded as unverified
    AllowUnverified,
}

/// Isolated execution domain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain RPC endpoint
    #[serde(default = "default_domain_endpoint")]
    pub endpoint: String,

    /// Designated validator identity (base58)
    #[serde(default = "default_validator")]
    pub validator: String,

    /// Program owning accounts while delegated (base58)
    #[serde(default = "default_delegation_program_id")]
    pub delegation_program_id: String,

    /// Health probe timeout in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    #[serde(default = "default_verification_mode")]
    pub verification: VerificationMode,
}

/// Resilient submission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    /// Total send attempts per phase
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Hard bound on confirmation in milliseconds
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,

    /// Signature status poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Fall back to simulated ids when the ledger is unavailable
    #[serde(default)]
    pub allow_simulated: bool,
}

/// Delegation confirmation polling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    #[serde(default = "default_delegation_timeout_ms")]
    pub timeout_ms: u64,
}

/// Route quote provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteConfig {
    #[serde(default = "default_quote_base_url")]
    pub base_url: String,

    /// Slippage used when a request does not specify one
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u16,

    /// Maximum quote age before it must be refetched, in seconds
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: u64,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Risk screening collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceConfig {
    #[serde(default = "default_compliance_base_url")]
    pub base_url: String,

    /// Bearer credential; usually supplied through the environment
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ledger_rpc_url() -> String {
    "https://api.devnet.solana.com".to_string()
}

fn default_program_id() -> String {
    "11111111111111111111111111111111".to_string()
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_domain_endpoint() -> String {
    "https://tee.magicblock.app".to_string()
}

fn default_validator() -> String {
    "FnE6VJT5QNZdedZPnCoLsARgBwoE6DeJNjBs2H1gySXA".to_string()
}

fn default_delegation_program_id() -> String {
    "DELeGGvXpWV2fqJUhqcF5ZSYMS4JTLjteaAMARRSaeSh".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

fn default_verification_mode() -> VerificationMode {
    VerificationMode::Strict
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1_000
}

fn default_confirmation_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_max_polls() -> u32 {
    20
}

fn default_delegation_timeout_ms() -> u64 {
    15_000
}

fn default_quote_base_url() -> String {
    "https://quote-api.jup.ag/v6".to_string()
}

fn default_slippage_bps() -> u16 {
    50 // 0.5%
}

fn default_staleness_secs() -> u64 {
    30
}

fn default_compliance_base_url() -> String {
    "https://api.range.org/v1".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Local,
            log_level: default_log_level(),
            json_logs: default_true(),
            metrics_enabled: default_true(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_ledger_rpc_url(),
            program_id: default_program_id(),
            commitment: default_commitment(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            endpoint: default_domain_endpoint(),
            validator: default_validator(),
            delegation_program_id: default_delegation_program_id(),
            probe_timeout_ms: default_probe_timeout_ms(),
            verification: default_verification_mode(),
        }
    }
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            allow_simulated: false,
        }
    }
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
            timeout_ms: default_delegation_timeout_ms(),
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_quote_base_url(),
            default_slippage_bps: default_slippage_bps(),
            staleness_secs: default_staleness_secs(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            base_url: default_compliance_base_url(),
            api_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
