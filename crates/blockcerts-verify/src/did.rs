//! DID documents and verification method resolution.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VerificationError;

/// Service type pointing from a DID document to the issuer profile
pub const ISSUER_PROFILE_SERVICE: &str = "IssuerProfile";

pub fn is_did_uri(uri: &str) -> bool {
    uri.starts_with("did:") && uri.split(':').count() >= 3
}

/// Public key in JSON Web Key form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyJwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: String,
    #[serde(rename = "type", default)]
    pub method_type: String,
    #[serde(default)]
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<PublicKeyJwk>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidService {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,
    #[serde(default, alias = "publicKey")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default)]
    pub service: Vec<DidService>,
}

impl DidDocument {
    /// Endpoint of the issuer profile service, if declared
    pub fn issuer_profile_endpoint(&self) -> Option<&str> {
        self.service
            .iter()
            .find(|service| service.service_type == ISSUER_PROFILE_SERVICE)
            .map(|service| service.service_endpoint.as_str())
    }

    /// Find a verification method by full id or by `#fragment`
    pub fn find_verification_method(&self, fragment: &str) -> Option<&VerificationMethod> {
        let full_id = format!("{}#{}", self.id, fragment);
        let local_id = format!("#{fragment}");
        self.verification_method
            .iter()
            .find(|method| method.id == full_id || method.id == local_id)
    }
}

/// Resolve the public key a verification method designates within a DID document.
///
/// The DID part of the method must be the document's own id.
pub fn retrieve_verification_method_public_key(
    did_document: Option<&DidDocument>,
    verification_method: &str,
) -> Result<PublicKeyJwk, VerificationError> {
    let document = did_document.ok_or_else(|| {
        VerificationError::VerificationMethod("issuer has no DID document".to_string())
    })?;
    let (did, fragment) = verification_method.split_once('#').ok_or_else(|| {
        VerificationError::VerificationMethod(format!(
            "{verification_method} does not reference a key"
        ))
    })?;
    if did != document.id {
        return Err(VerificationError::VerificationMethod(format!(
            "{did} does not match DID document {}",
            document.id
        )));
    }
    let method = document.find_verification_method(fragment).ok_or_else(|| {
        VerificationError::VerificationMethod(format!(
            "{verification_method} not found in DID document"
        ))
    })?;
    debug!("Resolved verification method {}", method.id);
    method.public_key_jwk.clone().ok_or_else(|| {
        VerificationError::VerificationMethod(format!("{} carries no publicKeyJwk", method.id))
    })
}
