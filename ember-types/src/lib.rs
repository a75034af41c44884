//! Shared type definitions for the Ember gas engine.
//!
//! Holds the fixed-point amount type every economic computation runs on,
//! the protocol constants that must be bit-exact across nodes, and the
//! transaction/account records passed between the other crates.

pub mod account;
pub mod auth;
pub mod constants;
pub mod error;
pub mod fixed;
pub mod gas;
pub mod primitives;
pub mod token;
pub mod transaction;
