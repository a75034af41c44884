//! Storage layer for the Ember gas engine.
//!
//! Provides a [`KvStore`](traits::KvStore) trait with memory and SQLite
//! backends, a write-buffering [`OverlayStore`](overlay::OverlayStore) used for
//! all-or-nothing transaction commits, and typed stores for the gas ledger,
//! token balances and freezes, and account permissions.

pub mod auth_store;
pub mod codec;
pub mod error;
pub mod gas_store;
pub mod memory;
pub mod overlay;
pub mod sqlite;
pub mod token_store;
pub mod traits;
