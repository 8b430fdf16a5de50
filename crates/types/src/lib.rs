pub mod account;
pub mod asset;
pub mod outcome;
pub mod phase;
pub mod quote;
pub mod record;
pub mod request;

pub use account::*;
pub use asset::*;
pub use outcome::*;
pub use phase::*;
pub use quote::*;
pub use record::*;
pub use request::*;
