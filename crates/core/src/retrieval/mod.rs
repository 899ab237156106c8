//! Retrieval coordination across the peer-to-peer and market paths.
//!
//! # Policy
//!
//! - Peer-to-peer first, when preferred and no selector is needed.
//! - Any peer-to-peer failure falls through to the market path.
//! - Market failure after that is reported as one combined error that still
//!   carries both path errors.

mod coordinator;
mod error;
mod types;

pub use coordinator::Retriever;
pub use error::RetrievalError;
pub use types::*;
