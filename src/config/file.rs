//! Config file loading with provenance.
//!
//! Every loaded source is tracked with its origin, path, SHA-256 digest
//! of the raw bytes, and load time, so the effective configuration can
//! always be traced back to where each contribution came from.

use super::{ConfigError, ConfigSpec, ConfigSpecScheme};
use cdist_runtime::{Codec, JSON, YAML};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Where a config source came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    /// Per-user configuration (e.g. `~/.config/cdist/config.yaml`).
    User,
    /// Project-local configuration (e.g. `.cdist/config.yaml`).
    Project,
    /// Supplied programmatically.
    Inline,
}

/// Provenance of one contributing config source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (absent for inline sources).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 hex digest of the raw bytes.
    pub digest: String,

    pub loaded_at: DateTime<Utc>,
}

/// A decoded config spec plus where it came from.
#[derive(Debug)]
pub struct LoadedConfig {
    pub spec: Box<dyn ConfigSpec>,
    pub source: ConfigSource,
}

/// Loads and decodes a config file. The codec is chosen by extension:
/// `.json` is JSON, everything else is YAML (which also accepts JSON).
pub fn load_config_file(
    path: &Path,
    origin: ConfigOrigin,
    types: &ConfigSpecScheme,
) -> Result<LoadedConfig, ConfigError> {
    let raw = fs::read(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let codec = codec_for_path(path);
    let mut loaded = load_config_bytes(&raw, codec, origin, types)?;
    loaded.source.path = Some(path.display().to_string());
    Ok(loaded)
}

/// Decodes config bytes with provenance for non-file sources.
pub fn load_config_bytes(
    raw: &[u8],
    codec: &dyn Codec,
    origin: ConfigOrigin,
    types: &ConfigSpecScheme,
) -> Result<LoadedConfig, ConfigError> {
    let spec = types.decode_with(raw, codec)?;
    Ok(LoadedConfig {
        spec,
        source: ConfigSource {
            origin,
            path: None,
            digest: hex::encode(Sha256::digest(raw)),
            loaded_at: Utc::now(),
        },
    })
}

fn codec_for_path(path: &Path) -> &'static dyn Codec {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => &JSON,
        _ => &YAML,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_config_scheme, ConfigContext};
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_load_yaml_file_with_provenance() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        let yaml = concat!(
            "type: generic.config.cdist/v1\n",
            "configurations:\n",
            "  - type: attributes.config.cdist\n",
            "    attributes:\n",
            "      signing.issuer: acme\n",
        );
        file.write_all(yaml.as_bytes()).unwrap();

        let types = default_config_scheme();
        let loaded = load_config_file(file.path(), ConfigOrigin::User, &types).unwrap();
        assert_eq!(loaded.source.origin, ConfigOrigin::User);
        assert_eq!(loaded.source.digest.len(), 64);
        assert!(loaded.source.path.is_some());

        let mut ctx = ConfigContext::new(types);
        ctx.apply(loaded.spec.as_ref()).unwrap();
        assert_eq!(ctx.attribute("signing.issuer"), Some(&json!("acme")));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let types = default_config_scheme();
        let err = load_config_file(Path::new("/nonexistent/config.yaml"), ConfigOrigin::User, &types)
            .unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.contains("nonexistent")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_inline_bytes_have_no_path() {
        let types = default_config_scheme();
        let raw = br#"{"type": "attributes.config.cdist", "attributes": {"a": 1}}"#;
        let loaded = load_config_bytes(raw, &JSON, ConfigOrigin::Inline, &types).unwrap();
        assert!(loaded.source.path.is_none());
        assert_eq!(
            loaded.source.digest,
            hex::encode(Sha256::digest(raw.as_slice()))
        );
    }
}
