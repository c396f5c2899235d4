//! Correlation of a DID signer with the address that anchored the credential.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bitcoin::{Address, PublicKey};
use sha3::{Digest, Keccak256};

use crate::chain::{AddressDerivation, Chain};
use crate::did::PublicKeyJwk;
use crate::error::VerificationError;

const SECP256K1_COORDINATE_LEN: usize = 32;

fn invalid_key(reason: impl Into<String>) -> VerificationError {
    VerificationError::VerificationMethod(format!("invalid public key: {}", reason.into()))
}

fn decode_coordinate(name: &str, encoded: Option<&str>) -> Result<Vec<u8>, VerificationError> {
    let encoded = encoded.ok_or_else(|| invalid_key(format!("missing {name} coordinate")))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim_end_matches('='))
        .map_err(|e| invalid_key(format!("{name}: {e}")))?;
    if bytes.len() != SECP256K1_COORDINATE_LEN {
        return Err(invalid_key(format!(
            "{name} coordinate is {} bytes long",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Affine coordinates of a secp256k1 JWK
fn secp256k1_coordinates(jwk: &PublicKeyJwk) -> Result<(Vec<u8>, Vec<u8>), VerificationError> {
    if jwk.kty != "EC" || jwk.crv != "secp256k1" {
        return Err(invalid_key(format!("unsupported key {}/{}", jwk.kty, jwk.crv)));
    }
    Ok((
        decode_coordinate("x", Some(&jwk.x))?,
        decode_coordinate("y", jwk.y.as_deref())?,
    ))
}

/// Derive the issuing address of a public key with the chain's derivation rule
pub fn derive_issuing_address(
    public_key: &PublicKeyJwk,
    chain: &Chain,
) -> Result<String, VerificationError> {
    match chain.derivation {
        AddressDerivation::BitcoinP2pkh(network) => {
            let (x, y) = secp256k1_coordinates(public_key)?;
            let mut compressed = Vec::with_capacity(1 + SECP256K1_COORDINATE_LEN);
            compressed.push(if y[SECP256K1_COORDINATE_LEN - 1] & 1 == 0 { 0x02 } else { 0x03 });
            compressed.extend_from_slice(&x);
            let key = PublicKey::from_slice(&compressed).map_err(|e| invalid_key(e.to_string()))?;
            Ok(Address::p2pkh(key.pubkey_hash(), network).to_string())
        }
        AddressDerivation::Ethereum => {
            let (x, y) = secp256k1_coordinates(public_key)?;
            let digest = Keccak256::new().chain_update(&x).chain_update(&y).finalize();
            Ok(format!("0x{}", hex::encode(&digest[12..])))
        }
        AddressDerivation::Unsupported => {
            Err(VerificationError::UnsupportedChain(chain.name.to_string()))
        }
    }
}

/// Exact match after case normalization
pub fn compare_issuing_address(claimed: &str, derived: &str) -> bool {
    claimed.to_lowercase() == derived.to_lowercase()
}

pub fn ensure_issuing_address_matches(
    claimed: &str,
    derived: &str,
) -> Result<(), VerificationError> {
    if compare_issuing_address(claimed, derived) {
        Ok(())
    } else {
        Err(VerificationError::IdentityMismatch {
            claimed: claimed.to_string(),
            derived: derived.to_string(),
        })
    }
}
