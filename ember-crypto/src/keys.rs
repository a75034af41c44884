use ed25519_dalek::{Signer, Verifier};
use ember_types::error::EmberError;
use ember_types::primitives::Algorithm;
use zeroize::Zeroizing;

/// Domain for the 32-byte digest secp256k1 signs over.
const SECP256K1_DIGEST_CONTEXT: &str = "ember 2024 secp256k1 message digest";

/// Secret key material tagged with the algorithm it belongs to.
///
/// The bytes are only parsed when signing or deriving the public key, so a
/// key pair built from malformed material surfaces the problem as a
/// [`EmberError::SigningError`] at use. Secret bytes are wiped on drop.
#[derive(Clone)]
pub struct KeyPair {
    algorithm: Algorithm,
    seckey: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate a new random key pair for the given algorithm.
    pub fn generate(algorithm: Algorithm) -> Self {
        let mut csprng = rand::rngs::OsRng;
        let seckey = match algorithm {
            Algorithm::Ed25519 => ed25519_dalek::SigningKey::generate(&mut csprng)
                .to_bytes()
                .to_vec(),
            Algorithm::Secp256k1 => libsecp256k1::SecretKey::random(&mut csprng)
                .serialize()
                .to_vec(),
        };
        Self::from_seckey(algorithm, seckey)
    }

    /// Wrap existing secret key bytes.
    ///
    /// Ed25519 accepts a 32-byte seed or a 64-byte `seed || pubkey` blob;
    /// secp256k1 expects a 32-byte scalar.
    pub fn from_seckey(algorithm: Algorithm, seckey: Vec<u8>) -> Self {
        Self {
            algorithm,
            seckey: Zeroizing::new(seckey),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Raw secret key bytes as supplied.
    pub fn seckey(&self) -> &[u8] {
        &self.seckey
    }

    fn ed25519_key(&self) -> Result<ed25519_dalek::SigningKey, EmberError> {
        let seed: [u8; 32] = match self.seckey.len() {
            32 | 64 => self.seckey[..32]
                .try_into()
                .map_err(|_| signing_error("ed25519 seed must be 32 bytes"))?,
            n => {
                return Err(signing_error(&format!(
                    "ed25519 secret key must be 32 or 64 bytes, got {n}"
                )))
            }
        };
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed))
    }

    fn secp256k1_key(&self) -> Result<libsecp256k1::SecretKey, EmberError> {
        libsecp256k1::SecretKey::parse_slice(&self.seckey)
            .map_err(|e| signing_error(&format!("secp256k1 secret key rejected: {e:?}")))
    }

    /// Derive the public key bytes (32 bytes for ed25519, 33-byte
    /// compressed point for secp256k1).
    pub fn public_key(&self) -> Result<Vec<u8>, EmberError> {
        match self.algorithm {
            Algorithm::Ed25519 => Ok(self.ed25519_key()?.verifying_key().to_bytes().to_vec()),
            Algorithm::Secp256k1 => {
                let sk = self.secp256k1_key()?;
                Ok(libsecp256k1::PublicKey::from_secret_key(&sk)
                    .serialize_compressed()
                    .to_vec())
            }
        }
    }

    /// Sign a message, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, EmberError> {
        match self.algorithm {
            Algorithm::Ed25519 => Ok(self.ed25519_key()?.sign(message).to_bytes().to_vec()),
            Algorithm::Secp256k1 => {
                let sk = self.secp256k1_key()?;
                let (sig, _) = libsecp256k1::sign(&secp256k1_digest(message), &sk);
                Ok(sig.serialize().to_vec())
            }
        }
    }
}

/// Domain-separated BLAKE3 digest of `message`.
fn secp256k1_digest(message: &[u8]) -> libsecp256k1::Message {
    let mut hasher = blake3::Hasher::new_derive_key(SECP256K1_DIGEST_CONTEXT);
    hasher.update(message);
    libsecp256k1::Message::parse(hasher.finalize().as_bytes())
}

fn signing_error(reason: &str) -> EmberError {
    EmberError::SigningError {
        reason: reason.to_string(),
    }
}

/// Verify a signature produced by [`KeyPair::sign`].
pub fn verify(
    algorithm: Algorithm,
    message: &[u8],
    signature: &[u8],
    pubkey: &[u8],
) -> Result<(), EmberError> {
    let invalid_key = |reason: &str| EmberError::InvalidKeyMaterial {
        reason: reason.to_string(),
    };
    let invalid_sig = EmberError::InvalidSignature { signer_index: 0 };

    match algorithm {
        Algorithm::Ed25519 => {
            let pk: [u8; 32] = pubkey
                .try_into()
                .map_err(|_| invalid_key("ed25519 public key must be 32 bytes"))?;
            let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&pk)
                .map_err(|_| invalid_key("ed25519 public key is not a curve point"))?;
            let sig: [u8; 64] = signature.try_into().map_err(|_| invalid_sig.clone())?;
            verifying_key
                .verify(message, &ed25519_dalek::Signature::from_bytes(&sig))
                .map_err(|_| invalid_sig)
        }
        Algorithm::Secp256k1 => {
            let pk = libsecp256k1::PublicKey::parse_slice(pubkey, None)
                .map_err(|_| invalid_key("secp256k1 public key rejected"))?;
            let sig = libsecp256k1::Signature::parse_standard_slice(signature)
                .map_err(|_| invalid_sig.clone())?;
            if libsecp256k1::verify(&secp256k1_digest(message), &sig, &pk) {
                Ok(())
            } else {
                Err(invalid_sig)
            }
        }
    }
}
