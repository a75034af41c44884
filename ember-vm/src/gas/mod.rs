//! Gas accounting: refresh and consumption of an account's stock, the pledge
//! engine, and the `gas.ember` contract exposing it.

pub mod contract;
pub mod pledge;
pub mod refresh;

pub use pledge::{check_pledge, pledge};
pub use refresh::{gas_info, pay_gas, refresh_gas};
