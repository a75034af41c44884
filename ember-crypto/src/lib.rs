//! Key pairs, signature verification, and signing accounts for the Ember gas
//! engine.

pub mod account;
pub mod keys;
