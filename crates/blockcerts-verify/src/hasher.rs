//! Local document hashing.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::VerificationError;

/// Members excluded from the hashed document
pub static UNSIGNED_MEMBERS: &[&str] = &["proof", "signature"];

/// Compute the hash of a credential compared against the receipt target hash
#[cfg_attr(test, mockall::automock)]
pub trait DocumentHasher: Send + Sync {
    fn hash(&self, document: &Value) -> Result<String, VerificationError>;
}

/// SHA-256 of the credential without its proof, serialized as sorted-key JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256JsonHasher;

impl DocumentHasher for Sha256JsonHasher {
    fn hash(&self, document: &Value) -> Result<String, VerificationError> {
        let Value::Object(members) = document else {
            return Err(VerificationError::InvalidCertificate(
                "credential is not a JSON object".to_string(),
            ));
        };
        let unsigned: Map<String, Value> = members
            .iter()
            .filter(|(key, _)| !UNSIGNED_MEMBERS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let bytes = serde_json::to_vec(&canonicalize(&Value::Object(unsigned)))
            .map_err(|e| VerificationError::InvalidCertificate(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// Rebuild objects with their keys inserted in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(members) => {
            let mut keys: Vec<&String> = members.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|key| (key.clone(), canonicalize(&members[key])))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
