use ember_types::constants::AMOUNT_DECIMALS;
use ember_types::error::EmberError;
use ember_types::fixed::Fixed;
use ember_types::primitives::{AccountId, Algorithm};
use ember_types::transaction::{Transaction, TxSignature};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::keys::KeyPair;

/// A user account: identifier, signing key, and a locally tracked balance.
///
/// The balance is a client-side mirror (wallets and test harnesses update it
/// as they observe transfers); the authoritative balance lives in the token
/// contract's store.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    key: KeyPair,
    balance: Fixed,
}

/// On-disk JSON form of an [`Account`].
#[derive(Serialize, Deserialize)]
struct AccountJson {
    id: String,
    seckey: String,
    algorithm: String,
}

impl Account {
    pub fn new(id: impl Into<AccountId>, key: KeyPair) -> Self {
        Self {
            id: id.into(),
            key,
            balance: Fixed::zero(AMOUNT_DECIMALS),
        }
    }

    /// Create an account with a freshly generated key.
    pub fn generate(id: impl Into<AccountId>, algorithm: Algorithm) -> Self {
        Self::new(id, KeyPair::generate(algorithm))
    }

    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    pub fn public_key(&self) -> Result<Vec<u8>, EmberError> {
        self.key.public_key()
    }

    /// Return a copy of `tx` carrying this account's signature appended to
    /// any existing ones.
    pub fn sign(&self, tx: &Transaction) -> Result<Transaction, EmberError> {
        let signature = self.key.sign(&tx.signing_data())?;
        let pubkey = self.key.public_key()?;
        let mut signed = tx.clone();
        signed.signatures.push(TxSignature {
            algorithm: self.key.algorithm(),
            pubkey,
            signature,
        });
        Ok(signed)
    }

    pub fn balance(&self) -> Fixed {
        self.balance
    }

    pub fn add_balance(&mut self, amount: &Fixed) -> Result<(), EmberError> {
        self.balance = self.balance.add(amount)?;
        Ok(())
    }

    /// Serialize as `{"id", "seckey" (base58), "algorithm"}`.
    pub fn to_json(&self) -> Result<String, EmberError> {
        serde_json::to_string_pretty(self).map_err(|e| EmberError::SerializationError {
            reason: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, EmberError> {
        serde_json::from_str(json).map_err(|e| EmberError::SerializationError {
            reason: e.to_string(),
        })
    }
}

impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        AccountJson {
            id: self.id.clone(),
            seckey: bs58::encode(self.key.seckey()).into_string(),
            algorithm: self.key.algorithm().to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let aux = AccountJson::deserialize(deserializer)?;
        let algorithm: Algorithm = aux.algorithm.parse().map_err(serde::de::Error::custom)?;
        let seckey = bs58::decode(&aux.seckey)
            .into_vec()
            .map_err(serde::de::Error::custom)?;
        Ok(Account::new(aux.id, KeyPair::from_seckey(algorithm, seckey)))
    }
}
