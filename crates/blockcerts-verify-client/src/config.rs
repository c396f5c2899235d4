//! Verifier configuration assembled from a file, the command line and the environment.

use std::path::Path;

use anyhow::Context;
use blockcerts_explorer_lookup::ExplorerApi;
use blockcerts_verify::VerifierConfig;
use serde_json::Value;

/// Read a credential from disk
pub fn read_credential(path: &Path) -> Result<Value, anyhow::Error> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credential {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Credential {} is not valid JSON", path.display()))
}

/// Load the verifier configuration, defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<VerifierConfig, anyhow::Error> {
    let Some(path) = path else {
        return Ok(VerifierConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid configuration {}", path.display()))
}

/// Parse an explorer override given as `name[,endpoint][,token]`
pub fn parse_explorer_api(value: &str) -> Result<ExplorerApi, String> {
    let mut fields = value.split(',').map(str::trim);
    let name = fields
        .next()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "missing explorer name".to_string())?;
    let mut optional = || fields.next().filter(|field| !field.is_empty()).map(String::from);
    let endpoint = optional();
    let token = optional();
    if fields.next().is_some() {
        return Err(format!("expected name[,endpoint][,token], got {value}"));
    }
    Ok(ExplorerApi {
        service_name: Some(name.to_string()),
        endpoint,
        token,
        priority: None,
    })
}

/// Set the token of `service` unless an override already targets it
pub fn with_token(config: &mut VerifierConfig, service: &str, token: Option<String>) {
    let Some(token) = token.filter(|token| !token.is_empty()) else {
        return;
    };
    let overridden = config
        .explorer_apis
        .iter()
        .any(|api| api.service_name.as_deref() == Some(service));
    if !overridden {
        config.explorer_apis.push(ExplorerApi {
            service_name: Some(service.to_string()),
            token: Some(token),
            ..ExplorerApi::default()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"explorerApis": [{{"serviceName": "blockcypher", "token": "abc", "priority": 0}}], "requestTimeoutSecs": 3}}"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.explorer_apis[0].token.as_deref(), Some("abc"));
        assert_eq!(config.explorer_apis[0].priority, Some(0));
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(load_config(None).unwrap(), VerifierConfig::default());
    }

    #[test]
    fn test_invalid_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "explorerApis: []").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"));

        let missing = file.path().with_extension("missing");
        assert!(read_credential(&missing).is_err());
    }

    #[test]
    fn test_parse_explorer_api() {
        let api = parse_explorer_api("mempool").unwrap();
        assert_eq!(api.service_name.as_deref(), Some("mempool"));
        assert_eq!(api.endpoint, None);

        let api = parse_explorer_api("etherscan,,secret").unwrap();
        assert_eq!(api.endpoint, None);
        assert_eq!(api.token.as_deref(), Some("secret"));

        let api = parse_explorer_api("blockstream, https://esplora.example/api").unwrap();
        assert_eq!(api.endpoint.as_deref(), Some("https://esplora.example/api"));

        assert!(parse_explorer_api("").is_err());
        assert!(parse_explorer_api("a,b,c,d").is_err());
    }

    #[test]
    fn test_environment_token_does_not_replace_override() {
        let mut config = VerifierConfig::default();
        with_token(&mut config, "etherscan", Some("from-env".to_string()));
        assert_eq!(config.explorer_apis.len(), 1);

        config.explorer_apis[0].token = Some("from-file".to_string());
        with_token(&mut config, "etherscan", Some("other".to_string()));
        with_token(&mut config, "blockcypher", None);
        assert_eq!(config.explorer_apis.len(), 1);
        assert_eq!(config.explorer_apis[0].token.as_deref(), Some("from-file"));
    }
}
