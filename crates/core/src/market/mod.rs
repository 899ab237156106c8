//! Storage-market retrieval: query, rank, then try candidates one by one.
//!
//! ```text
//! candidates ──► query_candidates ──► rank_candidates ──► retrieve_in_order
//!               (concurrent, drops    (unsealed, cost,    (serial, stops at
//!                failed queries)       size)               first success)
//! ```
//!
//! The stages are plain functions connected by data; the market protocol
//! itself lives behind the [`MarketClient`] trait.

mod cost;
mod driver;
mod fanout;
mod ranker;
mod types;

pub use cost::{format_fil, total_cost};
pub use driver::retrieve_in_order;
pub use fanout::query_candidates;
pub use ranker::{compare_query_results, rank_candidates};
pub use types::*;
