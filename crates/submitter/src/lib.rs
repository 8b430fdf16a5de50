//! Resilient submission of saga phases
//!
//! Each phase is built, signed once, sent with bounded retries and then
//! confirmed under a hard timeout. The execute phase consults a route quote
//! first and refuses stale or insufficient quotes.

mod error;
mod instruction;
mod retry;
mod submitter;

pub use error::SubmissionError;
pub use instruction::phase_instruction;
pub use retry::{Backoff, RetryPolicy};
pub use submitter::{PhaseContext, Route, SubmissionReport, Submitter, SubmitterConfig};
