//! Route quoting for the execute phase

mod jupiter;
mod mock;
mod provider;

pub use jupiter::{JupiterClient, DEFAULT_JUPITER_URL, JUPITER_PROGRAM_ID};
pub use mock::MockQuoteProvider;
pub use provider::{QuoteError, QuoteProvider, QuoteRequest};
