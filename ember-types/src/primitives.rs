use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::EmberError;

/// 32-byte BLAKE3 hash.
pub type Hash = [u8; 32];

/// Opaque, unique account name (e.g. `alice`).
pub type AccountId = String;

/// Identifier of a deployed or native contract (e.g. `gas.ember`).
pub type ContractId = String;

/// Unix timestamp in nanoseconds.
pub type Timestamp = i64;

/// Signing algorithm tag carried by key pairs and transaction signatures.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Ed25519,
    Secp256k1,
}

impl Algorithm {
    /// Canonical lowercase name used in account files and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Ed25519 => "ed25519",
            Algorithm::Secp256k1 => "secp256k1",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = EmberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ed25519" => Ok(Algorithm::Ed25519),
            "secp256k1" | "secp" => Ok(Algorithm::Secp256k1),
            other => Err(EmberError::UnknownAlgorithm(other.to_string())),
        }
    }
}
