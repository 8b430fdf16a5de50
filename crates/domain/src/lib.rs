//! Connection management for the isolated execution domain
//!
//! A run obtains a [`DomainChannel`] once, right before the execute phase, and
//! hands it to the submitter by reference. The channel never outlives the run.

mod auth;
mod channel;
mod manager;
mod probe;

pub use auth::{challenge_message, Credential, MessageSigner};
pub use channel::{ChannelOpener, DomainChannel, RpcChannelOpener, StaticChannelOpener};
pub use manager::{
    ConnectionError, ConnectionManager, DomainSettings, VerificationPolicy, DEFAULT_DOMAIN_ENDPOINT,
};
pub use probe::{DomainVerification, HealthProbe, HttpHealthProbe, StaticHealthProbe};
