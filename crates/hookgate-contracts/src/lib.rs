//! # hookgate-contracts
//!
//! Shared types and contracts for the hookgate policy gateway.
//!
//! All crates in the workspace import from here. No policy logic lives in
//! this crate, only data definitions and error types.

pub mod audit;
pub mod error;
pub mod event;
pub mod scope;
pub mod verdict;
