//! Individual checks run by verification steps.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::VerificationError;
use crate::issuer::IssuerPublicKeyList;
use crate::receipt::Receipt;

/// Local hash must equal the receipt target hash
pub fn ensure_hashes_equal(local: &str, target: &str) -> Result<(), VerificationError> {
    if local.eq_ignore_ascii_case(target) {
        Ok(())
    } else {
        Err(VerificationError::HashMismatch {
            local: local.to_string(),
            target: target.to_string(),
        })
    }
}

/// Merkle root must equal the hash anchored in the transaction
pub fn ensure_merkle_root_equal(merkle_root: &str, remote: &str) -> Result<(), VerificationError> {
    if merkle_root.eq_ignore_ascii_case(remote) {
        Ok(())
    } else {
        Err(VerificationError::MerkleRootMismatch {
            merkle_root: merkle_root.to_string(),
            remote: remote.to_string(),
        })
    }
}

fn decode_hash(hash: &str) -> Result<Vec<u8>, VerificationError> {
    hex::decode(hash).map_err(|_| VerificationError::InvalidMerkleReceipt)
}

/// Fold the receipt path over the target hash
pub fn compute_merkle_root(receipt: &Receipt) -> Result<String, VerificationError> {
    let mut current = decode_hash(&receipt.target_hash)?;
    for node in &receipt.path {
        let mut hasher = Sha256::new();
        match (&node.left, &node.right) {
            (Some(left), None) => {
                hasher.update(decode_hash(left)?);
                hasher.update(&current);
            }
            (None, Some(right)) => {
                hasher.update(&current);
                hasher.update(decode_hash(right)?);
            }
            _ => return Err(VerificationError::InvalidMerkleReceipt),
        }
        current = hasher.finalize().to_vec();
    }
    Ok(hex::encode(current))
}

/// The receipt path must lead from the target hash to the Merkle root
pub fn ensure_valid_receipt(receipt: &Receipt) -> Result<(), VerificationError> {
    if compute_merkle_root(receipt)?.eq_ignore_ascii_case(&receipt.merkle_root) {
        Ok(())
    } else {
        Err(VerificationError::InvalidMerkleReceipt)
    }
}

/// The issuing key must be listed by the issuer and valid at `time`
pub fn ensure_valid_issuing_key(
    keys: &IssuerPublicKeyList,
    issuing_address: &str,
    time: DateTime<Utc>,
) -> Result<(), VerificationError> {
    match keys.get(issuing_address) {
        Some(key) if key.is_valid_at(time) => Ok(()),
        _ => Err(VerificationError::Authenticity),
    }
}

pub fn ensure_not_expired(
    expires: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), VerificationError> {
    match expires {
        Some(expires) if expires <= now => Err(VerificationError::Expired(expires)),
        _ => Ok(()),
    }
}

/// Fail if the credential appears in the issuer's revocation list
pub fn ensure_not_revoked(
    revocation_list: Option<&Value>,
    credential_id: Option<&str>,
) -> Result<(), VerificationError> {
    let (Some(list), Some(credential_id)) = (revocation_list, credential_id) else {
        return Ok(());
    };
    let revoked = list
        .get("revokedAssertions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|assertion| assertion.get("id").and_then(Value::as_str) == Some(credential_id));
    match revoked {
        Some(assertion) => Err(VerificationError::Revoked {
            reason: assertion
                .get("revocationReason")
                .and_then(Value::as_str)
                .map(String::from),
        }),
        None => Ok(()),
    }
}

/// Fail if one of the credential's revocation keys was spent by the issuer
pub fn ensure_revocation_keys_unspent(
    revocation_keys: &[&str],
    revoked_addresses: &[String],
) -> Result<(), VerificationError> {
    match revocation_keys
        .iter()
        .find(|key| revoked_addresses.iter().any(|address| address == *key))
    {
        Some(key) => Err(VerificationError::Revoked {
            reason: Some(format!("revocation key {key} was spent")),
        }),
        None => Ok(()),
    }
}

const IMAGE_URI_PREFIX: &str = "data:image/";

fn collect_image_uris<'a>(value: &'a Value, images: &mut Vec<&'a str>) {
    match value {
        Value::String(s) if s.starts_with(IMAGE_URI_PREFIX) => images.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_image_uris(item, images)),
        Value::Object(members) => members
            .values()
            .for_each(|member| collect_image_uris(member, images)),
        _ => {}
    }
}

/// Every embedded `data:image/*;base64` URI must decode
pub fn ensure_valid_images(document: &Value) -> Result<(), VerificationError> {
    let mut images = Vec::new();
    collect_image_uris(document, &mut images);
    for image in images {
        let (header, data) = image
            .split_once(',')
            .ok_or_else(|| VerificationError::InvalidImage(format!("{image:.32}")))?;
        if header.ends_with(";base64") && STANDARD.decode(data.trim()).is_err() {
            return Err(VerificationError::InvalidImage(header.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::IssuerKey;
    use crate::receipt::MerklePathNode;
    use chrono::TimeZone;
    use serde_json::json;

    fn sha256_hex(parts: &[&[u8]]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        hex::encode(hasher.finalize())
    }

    fn receipt_with_path() -> Receipt {
        let target = [0x11u8; 32];
        let right = [0x22u8; 32];
        let left = [0x33u8; 32];
        let level1 = hex::decode(sha256_hex(&[&target, &right])).unwrap();
        let root = sha256_hex(&[&left, &level1]);
        Receipt {
            target_hash: hex::encode(target),
            merkle_root: root,
            path: vec![
                MerklePathNode {
                    left: None,
                    right: Some(hex::encode(right)),
                },
                MerklePathNode {
                    left: Some(hex::encode(left)),
                    right: None,
                },
            ],
            ..Receipt::default()
        }
    }

    #[test]
    fn test_valid_receipt() {
        ensure_valid_receipt(&receipt_with_path()).unwrap();

        let single_leaf = Receipt {
            target_hash: "aa".repeat(32),
            merkle_root: "aa".repeat(32),
            ..Receipt::default()
        };
        ensure_valid_receipt(&single_leaf).unwrap();
    }

    #[test]
    fn test_tampered_receipt() {
        let mut receipt = receipt_with_path();
        receipt.path.swap(0, 1);
        let err = ensure_valid_receipt(&receipt).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid Merkle Receipt. Proof hash did not match Merkle root"
        );

        let mut receipt = receipt_with_path();
        receipt.path[0].left = Some("00".repeat(32));
        assert!(ensure_valid_receipt(&receipt).is_err());
    }

    #[test]
    fn test_hash_comparisons() {
        ensure_hashes_equal("ABCD", "abcd").unwrap();
        assert!(matches!(
            ensure_hashes_equal("abcd", "abce"),
            Err(VerificationError::HashMismatch { .. })
        ));
        ensure_merkle_root_equal("abcd", "abcd").unwrap();
        assert!(matches!(
            ensure_merkle_root_equal("abcd", "dcba"),
            Err(VerificationError::MerkleRootMismatch { .. })
        ));
    }

    #[test]
    fn test_authenticity_interval() {
        let t0 = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let keys: IssuerPublicKeyList = [(
            "K1".to_string(),
            IssuerKey {
                created: Some(t0),
                revoked: None,
                expires: Some(t1),
            },
        )]
        .into_iter()
        .collect();

        ensure_valid_issuing_key(&keys, "K1", t0).unwrap();
        ensure_valid_issuing_key(&keys, "K1", t0 + chrono::Duration::days(100)).unwrap();
        for (key, time) in [
            ("K1", t1),
            ("K1", t0 - chrono::Duration::seconds(1)),
            ("K2", t0 + chrono::Duration::days(1)),
        ] {
            assert!(matches!(
                ensure_valid_issuing_key(&keys, key, time),
                Err(VerificationError::Authenticity)
            ));
        }
    }

    #[test]
    fn test_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ensure_not_expired(None, now).unwrap();
        ensure_not_expired(Some(now + chrono::Duration::days(1)), now).unwrap();
        assert!(matches!(
            ensure_not_expired(Some(now - chrono::Duration::days(1)), now),
            Err(VerificationError::Expired(_))
        ));
    }

    #[test]
    fn test_revocation_list() {
        let list = json!({"revokedAssertions": [
            {"id": "urn:uuid:revoked", "revocationReason": "Accidentally issued"}
        ]});
        ensure_not_revoked(Some(&list), Some("urn:uuid:valid")).unwrap();
        ensure_not_revoked(None, Some("urn:uuid:revoked")).unwrap();
        let err = ensure_not_revoked(Some(&list), Some("urn:uuid:revoked")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "This certificate has been revoked by the issuer. Reason given: Accidentally issued"
        );

        ensure_revocation_keys_unspent(&["a"], &["b".to_string()]).unwrap();
        assert!(ensure_revocation_keys_unspent(&["a"], &["a".to_string()]).is_err());
    }

    #[test]
    fn test_images() {
        ensure_valid_images(&json!({"badge": {"image": "data:image/png;base64,iVBORw0KGgo="}}))
            .unwrap();
        ensure_valid_images(&json!({"image": "https://issuer.example/logo.png"})).unwrap();
        assert!(matches!(
            ensure_valid_images(&json!({"display": [{"image": "data:image/png;base64,@@@"}]})),
            Err(VerificationError::InvalidImage(_))
        ));
    }
}
