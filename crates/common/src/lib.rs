//! Shared building blocks for the grouped_kv crates: wire types and
//! tracing initialization.

pub mod types;
pub mod utils;
