//! Domain models for guardia.
//!
//! These are the core types shared across all crates.

pub mod account;
pub mod audit;
pub mod permission;
pub mod role;
pub mod session;
