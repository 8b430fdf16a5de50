//! Ledger transport shared by the submitter and the isolated domain channel
//!
//! Both the public ledger and the isolated domain speak the same JSON-RPC
//! dialect, so one client trait covers them. The domain variant simply points
//! at a different endpoint with a credential attached.

pub mod client;
pub mod mock;

pub use client::{LedgerClient, LedgerClientConfig, LedgerError, RpcLedgerClient, SignatureState};
pub use mock::{Journal, MockLedgerClient, SendBehavior, SentTransaction, StatusBehavior};
