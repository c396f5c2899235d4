use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::did::is_did_uri;
use crate::error::VerificationError;

/// Proof type of proofs wrapping another proof
pub const CHAINED_PROOF_2021: &str = "ChainedProof2021";

/// Verifiable credential proof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default)]
    pub proof_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,
    #[serde(default)]
    pub verification_method: String,
    /// Type of the nested proof when `type` is `ChainedProof2021`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chained_proof_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_proof: Option<Value>,
}

impl VcProof {
    pub fn is_chained(&self) -> bool {
        self.proof_type == CHAINED_PROOF_2021
    }

    /// Type the proof must be verified as, one level deeper for chained proofs
    pub fn declared_type(&self) -> &str {
        if self.is_chained() {
            self.chained_proof_type.as_deref().unwrap_or_default()
        } else {
            &self.proof_type
        }
    }

    /// Verification method without its key fragment
    pub fn verification_method_base(&self) -> &str {
        self.verification_method
            .split('#')
            .next()
            .unwrap_or_default()
    }

    pub fn signed_by_did(&self) -> bool {
        is_did_uri(self.verification_method_base())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created
            .as_deref()
            .and_then(|created| DateTime::parse_from_rfc3339(created).ok())
            .map(|created| created.with_timezone(&Utc))
    }

    /// Extract the proof of a credential.
    ///
    /// When several proofs are attached, the first one declaring `preferred_type` wins.
    pub fn from_document(document: &Value, preferred_type: &str) -> Result<Self, VerificationError> {
        let parse = |value: &Value| {
            serde_json::from_value::<VcProof>(value.clone())
                .map_err(|e| VerificationError::InvalidCertificate(format!("malformed proof: {e}")))
        };
        match document.get("proof") {
            Some(Value::Array(proofs)) => {
                let proofs = proofs.iter().map(parse).collect::<Result<Vec<_>, _>>()?;
                let preferred = proofs
                    .iter()
                    .position(|proof| proof.declared_type() == preferred_type)
                    .unwrap_or(0);
                proofs.into_iter().nth(preferred).ok_or_else(|| {
                    VerificationError::InvalidCertificate("empty proof list".to_string())
                })
            }
            Some(proof) => parse(proof),
            None => Err(VerificationError::InvalidCertificate(
                "credential carries no proof".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chained_proof_declares_nested_type() {
        let proof: VcProof = serde_json::from_value(json!({
            "type": "ChainedProof2021",
            "chainedProofType": "MerkleProof2019",
            "verificationMethod": "did:ion:EiA123#key-1",
            "proofValue": "z123"
        }))
        .unwrap();
        assert!(proof.is_chained());
        assert_eq!(proof.declared_type(), "MerkleProof2019");
        assert_eq!(proof.verification_method_base(), "did:ion:EiA123");
        assert!(proof.signed_by_did());
    }

    #[test]
    fn test_from_document_prefers_requested_type() {
        let document = json!({"proof": [
            {"type": "Ed25519Signature2020", "verificationMethod": "https://issuer.example#k"},
            {"type": "MerkleProof2019", "proofValue": "z1", "created": "2022-04-05T13:43:10Z"}
        ]});
        let proof = VcProof::from_document(&document, "MerkleProof2019").unwrap();
        assert_eq!(proof.proof_value, "z1");
        assert_eq!(proof.created_at().unwrap().timestamp(), 1649166190);
        assert!(!proof.signed_by_did());

        assert!(VcProof::from_document(&json!({}), "MerkleProof2019").is_err());
    }
}
