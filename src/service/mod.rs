//! Service module: runs compiled queries against a live FROST endpoint.
//!
//! The query core never touches the network. [`QueryExecutor`] is the seam;
//! [`HttpExecutor`] is the production implementation and tests substitute
//! their own.

pub mod client;
pub mod entity;
pub mod executor;

pub use client::FrostClient;
pub use entity::Entity;
pub use executor::{HttpExecutor, QueryExecutor, RetryPolicy};
