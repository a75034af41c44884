//! The `ember` command-line node: configuration, genesis seeding, and
//! one-shot execution of gas operations against a local store.

pub mod cli;
pub mod config;
pub mod error;
pub mod genesis;
pub mod store;
