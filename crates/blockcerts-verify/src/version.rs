//! Certificate format versions.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CertificateVersion {
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "1.2")]
    V1_2,
    #[serde(rename = "2.0")]
    V2_0,
    #[serde(rename = "3.0-alpha")]
    V3_0Alpha,
    #[serde(rename = "3.0-beta")]
    V3_0Beta,
    #[serde(rename = "3.0")]
    V3_0,
}

impl CertificateVersion {
    pub fn is_v3(&self) -> bool {
        matches!(self, Self::V3_0Alpha | Self::V3_0Beta | Self::V3_0)
    }

    pub fn is_v1(&self) -> bool {
        matches!(self, Self::V1_1 | Self::V1_2)
    }

    /// Detect the version from the credential's `@context`.
    ///
    /// v1.1 documents carry no context and are recognized by their `certificate` member.
    pub fn detect(document: &Value) -> Option<Self> {
        let contexts: Vec<&str> = match document.get("@context") {
            Some(Value::String(context)) => vec![context.as_str()],
            Some(Value::Array(contexts)) => contexts.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        let mentions = |needle: &str| contexts.iter().any(|context| context.contains(needle));

        if mentions("blockcerts/3.0-alpha") || mentions("schema/3.0-alpha") {
            Some(Self::V3_0Alpha)
        } else if mentions("blockcerts/3.0-beta") || mentions("schema/3.0-beta") {
            Some(Self::V3_0Beta)
        } else if mentions("blockcerts/v3") || mentions("schema/3.0") {
            Some(Self::V3_0)
        } else if mentions("blockcerts/v2") || mentions("schema/2.0") {
            Some(Self::V2_0)
        } else if mentions("blockcerts/v1") || mentions("schema/1.2") {
            Some(Self::V1_2)
        } else if document.get("certificate").is_some() {
            Some(Self::V1_1)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_versions() {
        let v3 = json!({"@context": [
            "https://www.w3.org/2018/credentials/v1",
            "https://w3id.org/blockcerts/v3"
        ]});
        assert_eq!(CertificateVersion::detect(&v3), Some(CertificateVersion::V3_0));

        let beta = json!({"@context": ["https://w3id.org/blockcerts/3.0-beta"]});
        assert_eq!(CertificateVersion::detect(&beta), Some(CertificateVersion::V3_0Beta));

        let v2 = json!({"@context": ["https://w3id.org/openbadges/v2", "https://w3id.org/blockcerts/v2"]});
        assert_eq!(CertificateVersion::detect(&v2), Some(CertificateVersion::V2_0));

        let v11 = json!({"certificate": {}, "assertion": {}});
        assert_eq!(CertificateVersion::detect(&v11), Some(CertificateVersion::V1_1));

        assert_eq!(CertificateVersion::detect(&json!({"foo": 1})), None);
    }

    #[test]
    fn test_v3_family() {
        assert!(CertificateVersion::V3_0Alpha.is_v3());
        assert!(CertificateVersion::V3_0Beta.is_v3());
        assert!(CertificateVersion::V3_0.is_v3());
        assert!(!CertificateVersion::V2_0.is_v3());
        assert!(CertificateVersion::V1_2.is_v1());
    }
}
