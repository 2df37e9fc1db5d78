//! Fetch USD unit prices for a fixed set of tokens and convert USD amounts
//! into token quantities.

pub mod amount;
pub mod config;
pub mod convert;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod types;
