//! Core types, validation and cost aggregation for subscription tracking.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod month;
pub mod request;
pub mod service;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
