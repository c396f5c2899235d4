#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blockcerts_explorer_lookup::{
    ExplorerError, ExplorerLookup, ExplorerLookups, JsonFetcher, LookupNetwork, TransactionData,
    TransactionProvider,
};
use blockcerts_verify::hasher::{DocumentHasher, Sha256JsonHasher};
use blockcerts_verify::inspectors::compute_merkle_root;
use blockcerts_verify::receipt::{encode_receipt, Anchor, MerklePathNode};
use blockcerts_verify::{
    Issuer, IssuerProfileError, IssuerProfileRetriever, Receipt, ReceiptDecoder,
    VerificationError,
};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

pub const TXID: &str = "1e956a31736ad3bddf6302ba56050a3a36983610afeb9919256fd4d82e5dc175";
pub const ISSUER_DID: &str = "did:example:issuer";
pub const TESTNET_ADDRESS: &str = "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r";
pub const PROFILE_URL: &str = "https://issuer.example/profile.json";
pub const REVOCATION_URL: &str = "https://issuer.example/revocation.json";
pub const CREDENTIAL_ID: &str = "urn:uuid:bbba8553-8ec1-445f-82c9-a57251dd731c";

/// secp256k1 generator point, whose testnet P2PKH address is [`TESTNET_ADDRESS`]
pub fn generator_jwk() -> Value {
    json!({
        "kty": "EC",
        "crv": "secp256k1",
        "x": "eb5mfvncu6xVoGKVzocLBwKb_NstzijZWfKBWxb4F5g",
        "y": "SDradyajxGVdpPv8DhEIqP0XtEimhVQZnEfQj_sQ1Lg"
    })
}

pub fn did_document() -> Value {
    json!({
        "id": ISSUER_DID,
        "verificationMethod": [{
            "id": "#key-1",
            "type": "EcdsaSecp256k1VerificationKey2019",
            "controller": ISSUER_DID,
            "publicKeyJwk": generator_jwk()
        }],
        "service": [{
            "id": "#service-1",
            "type": "IssuerProfile",
            "serviceEndpoint": PROFILE_URL
        }]
    })
}

pub fn issuer_profile() -> Value {
    json!({
        "@context": ["https://w3id.org/openbadges/v2", "https://w3id.org/blockcerts/v3"],
        "type": "Profile",
        "id": PROFILE_URL,
        "name": "Example University",
        "email": "registrar@issuer.example",
        "revocationList": REVOCATION_URL,
        "publicKey": [{
            "id": format!("ecdsa-koblitz-pubkey:{TESTNET_ADDRESS}"),
            "created": "2020-01-01T00:00:00Z"
        }]
    })
}

/// Issuer as resolved from [`ISSUER_DID`]
pub fn did_issuer() -> Issuer {
    let mut issuer: Issuer = serde_json::from_value(issuer_profile()).unwrap();
    issuer.did_document = Some(serde_json::from_value(did_document()).unwrap());
    issuer
}

/// Unsigned v3 credential issued by [`ISSUER_DID`]
pub fn unsigned_credential() -> Value {
    json!({
        "@context": [
            "https://www.w3.org/2018/credentials/v1",
            "https://w3id.org/blockcerts/v3"
        ],
        "id": CREDENTIAL_ID,
        "type": ["VerifiableCredential", "BlockcertsCredential"],
        "issuer": ISSUER_DID,
        "issuanceDate": "2022-04-05T13:43:10Z",
        "credentialSubject": {
            "id": "did:example:recipient",
            "name": "Jane Doe",
            "claim": {"name": "Master of Puppets"}
        }
    })
}

/// Receipt committing to `document`, with one sibling on its path
pub fn receipt_for(document: &Value, anchor: &str) -> Receipt {
    let mut receipt = Receipt {
        target_hash: Sha256JsonHasher.hash(document).unwrap(),
        path: vec![MerklePathNode {
            left: None,
            right: Some("51b4e7e5c2e4ce8cd6a1b6ab1d31e1a1b61e6ecb1a1a5bd8e1cfd4e7a4c5c1d9".into()),
        }],
        anchors: vec![Anchor::Blink(anchor.to_string())],
        ..Receipt::default()
    };
    receipt.merkle_root = compute_merkle_root(&receipt).unwrap();
    receipt
}

/// Attach a MerkleProof2019 proof carrying `receipt` to `document`
pub fn sign(mut document: Value, receipt: &Receipt, verification_method: &str) -> Value {
    document["proof"] = json!({
        "type": "MerkleProof2019",
        "created": "2022-04-05T13:43:10.870521",
        "proofValue": encode_receipt(receipt).unwrap(),
        "proofPurpose": "assertionMethod",
        "verificationMethod": verification_method
    });
    document
}

pub fn testnet_credential() -> (Value, Receipt) {
    let document = unsigned_credential();
    let receipt = receipt_for(&document, &format!("blink:btc:testnet:{TXID}"));
    (
        sign(document, &receipt, &format!("{ISSUER_DID}#key-1")),
        receipt,
    )
}

pub fn anchoring_transaction(remote_hash: &str, issuing_address: &str) -> TransactionData {
    TransactionData {
        remote_hash: remote_hash.to_string(),
        issuing_address: issuing_address.to_string(),
        time: Utc.with_ymd_and_hms(2022, 4, 5, 13, 43, 10).unwrap(),
        revoked_addresses: Vec::new(),
    }
}

/// Explorer answering every lookup with the same transaction
pub struct StaticTransactionProvider {
    pub data: TransactionData,
    pub calls: AtomicUsize,
}

impl StaticTransactionProvider {
    pub fn new(data: TransactionData) -> Arc<Self> {
        Arc::new(Self {
            data,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TransactionProvider for StaticTransactionProvider {
    fn name(&self) -> String {
        "static".to_string()
    }

    async fn get_transaction_data(
        &self,
        _transaction_id: &str,
        _network: LookupNetwork,
    ) -> Result<TransactionData, ExplorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.clone())
    }
}

pub fn bitcoin_lookups(provider: Arc<StaticTransactionProvider>) -> Arc<ExplorerLookups> {
    Arc::new(ExplorerLookups {
        bitcoin: ExplorerLookup::new(vec![provider as Arc<dyn TransactionProvider>]),
        ..ExplorerLookups::default()
    })
}

/// Issuer profile store keyed by address, recording every request
#[derive(Default)]
pub struct StaticIssuerProfiles {
    pub profiles: HashMap<String, Issuer>,
    pub requests: Mutex<Vec<Option<String>>>,
}

impl StaticIssuerProfiles {
    pub fn with(address: &str, issuer: Issuer) -> Arc<Self> {
        Arc::new(Self {
            profiles: HashMap::from([(address.to_string(), issuer)]),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl IssuerProfileRetriever for StaticIssuerProfiles {
    async fn get_issuer_profile(&self, address: Option<&str>) -> Result<Issuer, IssuerProfileError> {
        self.requests
            .lock()
            .unwrap()
            .push(address.map(String::from));
        let address = address.ok_or(IssuerProfileError::MissingAddress)?;
        self.profiles
            .get(address)
            .cloned()
            .ok_or_else(|| IssuerProfileError::Unreachable {
                url: address.to_string(),
                reason: "unknown issuer".to_string(),
            })
    }
}

/// Decoder that must never be reached
pub struct UnreachableDecoder {
    pub calls: AtomicUsize,
}

impl UnreachableDecoder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl ReceiptDecoder for UnreachableDecoder {
    fn decode(&self, _proof_value: &str) -> Result<Receipt, VerificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(VerificationError::Decode("decoder should not run".to_string()))
    }
}

/// JSON documents served by exact URL
#[derive(Default)]
pub struct StaticFetcher {
    pub documents: HashMap<String, Value>,
}

impl StaticFetcher {
    pub fn with(mut self, url: &str, document: Value) -> Self {
        self.documents.insert(url.to_string(), document);
        self
    }
}

#[async_trait]
impl JsonFetcher for StaticFetcher {
    async fn get_json(&self, url: &str) -> Result<Value, ExplorerError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ExplorerError::UnknownService(format!("no document at {url}")))
    }
}
