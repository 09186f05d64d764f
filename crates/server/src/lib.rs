//! HTTP transport for the Tally counting engine
//!
//! Thin glue only: routing, CORS, client-address extraction, config
//! loading, and the background retention task. All counting decisions
//! live in `tally-ledger`.

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod sweeper;
