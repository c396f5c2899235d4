//! Issuer profiles: retrieval over HTTP (including DID issuers) and key list parsing.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use blockcerts_explorer_lookup::JsonFetcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::did::{is_did_uri, DidDocument};
use crate::error::{IssuerProfileError, VerificationError};

/// Default universal resolver used to resolve DID issuers
pub const DEFAULT_DID_RESOLVER_URL: &str = "https://resolver.identity.foundation/1.0/identifiers/";

/// Prefix of bitcoin keys in issuer profiles
pub const PUBLIC_KEY_PREFIX: &str = "ecdsa-koblitz-pubkey:";

static PROFILE_TYPES: &[&str] = &["Profile", "Issuer", "BlockcertsIssuer"];

/// Issuer profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub issuer_type: Option<Value>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_list: Option<String>,
    /// v2/v3 key list
    #[serde(default, alias = "publicKeys", skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Value>,
    /// v1 key list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_keys: Option<Value>,
    /// Attached when the issuer was resolved from a DID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did_document: Option<DidDocument>,
}

impl Issuer {
    /// Issuer referenced by a credential: either a URL string or an object with an id
    pub fn reference(document: &Value) -> Option<&str> {
        let issuer = document
            .get("issuer")
            .or_else(|| document.pointer("/badge/issuer"))?;
        match issuer {
            Value::String(id) => Some(id.as_str()),
            Value::Object(members) => members.get("id").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Validity window of an issuer key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssuerKey {
    pub created: Option<DateTime<Utc>>,
    pub revoked: Option<DateTime<Utc>>,
    pub expires: Option<DateTime<Utc>>,
}

impl IssuerKey {
    /// `created <= time < revoked/expires`, open bounds are ignored
    pub fn is_valid_at(&self, time: DateTime<Utc>) -> bool {
        self.created.map_or(true, |created| created <= time)
            && self.revoked.map_or(true, |revoked| time < revoked)
            && self.expires.map_or(true, |expires| time < expires)
    }
}

/// Issuer keys by identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssuerPublicKeyList(BTreeMap<String, IssuerKey>);

impl IssuerPublicKeyList {
    pub fn get(&self, key: &str) -> Option<&IssuerKey> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IssuerKey)> {
        self.0.iter()
    }
}

impl FromIterator<(String, IssuerKey)> for IssuerPublicKeyList {
    fn from_iter<T: IntoIterator<Item = (String, IssuerKey)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn parse_date(entry: &Value, fields: &[&str]) -> Result<Option<DateTime<Utc>>, VerificationError> {
    let Some(raw) = fields.iter().find_map(|field| entry.get(*field).and_then(Value::as_str)) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|date| Some(date.with_timezone(&Utc)))
        .map_err(|e| VerificationError::IssuerKeys(format!("invalid date {raw}: {e}")))
}

fn parse_key_entry(entry: &Value) -> Result<(String, IssuerKey), VerificationError> {
    let raw_id = match entry {
        Value::String(id) => Some(id.as_str()),
        Value::Object(_) => ["id", "publicKey", "key"]
            .iter()
            .find_map(|field| entry.get(*field).and_then(Value::as_str)),
        _ => None,
    }
    .ok_or_else(|| VerificationError::IssuerKeys("key entry without identifier".to_string()))?;

    let id = raw_id.strip_prefix(PUBLIC_KEY_PREFIX).unwrap_or(raw_id);
    Ok((
        id.to_string(),
        IssuerKey {
            created: parse_date(entry, &["created", "date"])?,
            revoked: parse_date(entry, &["revoked"])?,
            expires: parse_date(entry, &["expires"])?,
        },
    ))
}

/// Parse the issuer's key list from `publicKey` (v2, v3) or `issuerKeys` (v1)
pub fn parse_issuer_keys(issuer: &Issuer) -> Result<IssuerPublicKeyList, VerificationError> {
    let entries = match issuer.public_key.as_ref().or(issuer.issuer_keys.as_ref()) {
        Some(Value::Array(entries)) => entries.clone(),
        Some(single @ (Value::String(_) | Value::Object(_))) => vec![single.clone()],
        _ => {
            return Err(VerificationError::IssuerKeys(
                "issuer profile declares no public key".to_string(),
            ))
        }
    };
    let keys = entries
        .iter()
        .map(parse_key_entry)
        .collect::<Result<IssuerPublicKeyList, _>>()?;
    if keys.is_empty() {
        return Err(VerificationError::IssuerKeys(
            "issuer profile declares no public key".to_string(),
        ));
    }
    debug!("Parsed {} issuer keys", keys.len());
    Ok(keys)
}

/// Retrieve an issuer profile from its address
#[async_trait]
pub trait IssuerProfileRetriever: Send + Sync {
    async fn get_issuer_profile(&self, address: Option<&str>) -> Result<Issuer, IssuerProfileError>;
}

fn declares_profile_type(value: &Value) -> bool {
    match value.get("type") {
        Some(Value::String(t)) => PROFILE_TYPES.contains(&t.as_str()),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| PROFILE_TYPES.contains(&t)),
        _ => value.get("issuerKeys").is_some(),
    }
}

/// Validate the shape of a fetched profile
pub fn parse_issuer_profile(value: Value) -> Result<Issuer, IssuerProfileError> {
    if !value.is_object() || !declares_profile_type(&value) {
        return Err(IssuerProfileError::InvalidProfile);
    }
    serde_json::from_value(value).map_err(|_| IssuerProfileError::InvalidProfile)
}

/// Issuer profile retrieval over HTTP, resolving DID issuers through a DID resolver
#[derive(Clone)]
pub struct HttpIssuerProfileRetriever {
    fetcher: Arc<dyn JsonFetcher>,
    did_resolver_url: String,
}

impl HttpIssuerProfileRetriever {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, did_resolver_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            did_resolver_url: did_resolver_url.into(),
        }
    }

    async fn fetch(&self, url: &str) -> Result<Value, IssuerProfileError> {
        self.fetcher
            .get_json(url)
            .await
            .map_err(|err| IssuerProfileError::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            })
    }

    async fn resolve_did_issuer(&self, did: &str) -> Result<Issuer, IssuerProfileError> {
        let resolution = self
            .fetch(&format!("{}{}", self.did_resolver_url, did))
            .await?;
        let document = resolution
            .get("didDocument")
            .cloned()
            .unwrap_or(resolution);
        let did_document: DidDocument =
            serde_json::from_value(document).map_err(|_| IssuerProfileError::InvalidProfile)?;
        let endpoint = did_document
            .issuer_profile_endpoint()
            .ok_or(IssuerProfileError::InvalidProfile)?;
        info!("Resolved {} to issuer profile {}", did, endpoint);

        let mut issuer = parse_issuer_profile(self.fetch(endpoint).await?)?;
        issuer.did_document = Some(did_document);
        Ok(issuer)
    }
}

#[async_trait]
impl IssuerProfileRetriever for HttpIssuerProfileRetriever {
    async fn get_issuer_profile(&self, address: Option<&str>) -> Result<Issuer, IssuerProfileError> {
        let address = address
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .ok_or(IssuerProfileError::MissingAddress)?;

        if is_did_uri(address) {
            return self.resolve_did_issuer(address).await;
        }

        let url = Url::parse(address).map_err(|_| IssuerProfileError::MissingAddress)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(IssuerProfileError::MissingAddress);
        }
        debug!("Fetching issuer profile {}", url);
        parse_issuer_profile(self.fetch(url.as_str()).await?)
    }
}
