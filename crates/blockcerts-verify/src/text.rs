//! Human readable step labels.

/// Label categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCategory {
    Steps,
    SubSteps,
}

/// Resolve a label by category and key (`<code>Label` or `<code>LabelPending`)
pub trait TextLookup: Send + Sync {
    fn get_text(&self, category: TextCategory, key: &str) -> String;
}

static STEPS_EN: &[(&str, &str)] = &[
    ("formatValidationLabel", "Format validation"),
    ("formatValidationLabelPending", "Validating format"),
    ("signatureVerificationLabel", "Signature verification"),
    ("signatureVerificationLabelPending", "Verifying signature"),
    ("identityVerificationLabel", "Identity verification"),
    ("identityVerificationLabelPending", "Verifying identity"),
    ("statusCheckLabel", "Status check"),
    ("statusCheckLabelPending", "Checking record status"),
];

static SUB_STEPS_EN: &[(&str, &str)] = &[
    ("getTransactionIdLabel", "Get transaction ID"),
    ("getTransactionIdLabelPending", "Getting transaction ID"),
    ("computeLocalHashLabel", "Compute local hash"),
    ("computeLocalHashLabelPending", "Computing local hash"),
    ("fetchRemoteHashLabel", "Fetch remote hash"),
    ("fetchRemoteHashLabelPending", "Fetching remote hash"),
    ("getIssuerProfileLabel", "Get issuer profile"),
    ("getIssuerProfileLabelPending", "Getting issuer profile"),
    ("parseIssuerKeysLabel", "Parse issuer keys"),
    ("parseIssuerKeysLabelPending", "Parsing issuer keys"),
    ("compareHashesLabel", "Compare hashes"),
    ("compareHashesLabelPending", "Comparing hashes"),
    ("checkImagesIntegrityLabel", "Check images integrity"),
    ("checkImagesIntegrityLabelPending", "Checking images integrity"),
    ("checkMerkleRootLabel", "Check Merkle Root"),
    ("checkMerkleRootLabelPending", "Checking Merkle Root"),
    ("checkReceiptLabel", "Check Receipt"),
    ("checkReceiptLabelPending", "Checking Receipt"),
    ("checkRevokedStatusLabel", "Check Revoked Status"),
    ("checkRevokedStatusLabelPending", "Checking Revoked Status"),
    ("checkAuthenticityLabel", "Check Authenticity"),
    ("checkAuthenticityLabelPending", "Checking Authenticity"),
    ("checkExpiresDateLabel", "Check Expiration Date"),
    ("checkExpiresDateLabelPending", "Checking Expiration Date"),
    (
        "retrieveVerificationMethodPublicKeyLabel",
        "Retrieve verification method public key",
    ),
    (
        "retrieveVerificationMethodPublicKeyLabelPending",
        "Retrieving verification method public key",
    ),
    (
        "deriveIssuingAddressFromPublicKeyLabel",
        "Derive issuing address from public key",
    ),
    (
        "deriveIssuingAddressFromPublicKeyLabelPending",
        "Deriving issuing address from public key",
    ),
    ("compareIssuingAddressLabel", "Compare issuing address"),
    ("compareIssuingAddressLabelPending", "Comparing issuing address"),
];

/// Built-in English labels
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishText;

impl TextLookup for EnglishText {
    fn get_text(&self, category: TextCategory, key: &str) -> String {
        let table = match category {
            TextCategory::Steps => STEPS_EN,
            TextCategory::SubSteps => SUB_STEPS_EN,
        };
        table
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, text)| text.to_string())
            .unwrap_or_else(|| "[missing locale item data]".to_string())
    }
}
