//! Gas engine for the Ember virtual machine.
//!
//! Accounts pledge native token to the `gas.ember` contract in exchange for a
//! replenishing gas stock; the [`executor`] meters every transaction against
//! that stock. Contracts are native and dispatched through an explicit
//! [`ContractRegistry`](abi::ContractRegistry) handed to the [`Host`](host::Host).

pub mod abi;
pub mod call_stack;
pub mod context;
pub mod cost;
pub mod error;
pub mod executor;
pub mod gas;
pub mod host;
pub mod token;
