//! Transaction scripts and engine configuration files.
//!
//! A script is a JSON array of steps. Each step names the request and,
//! optionally, the accounts that signed the envelope:
//!
//! ```json
//! [
//!   { "signers": ["0x01cf0e2f2f715450"],
//!     "request": { "type": "setup", "owner": "0x01cf0e2f2f715450",
//!                  "public_key_a": "…", "public_key_b": "…" } },
//!   { "request": { "type": "deposit", "owner": "0x01cf0e2f2f715450",
//!                  "amount": "10.00000000" } }
//! ]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use cold_storage_contracts::Transaction;
use cold_storage_protocol::config::EngineConfig;
use cold_storage_protocol::vault::{AccountId, VaultRequest};

/// One entry of a transaction script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    #[serde(default)]
    pub signers: Vec<AccountId>,
    pub request: VaultRequest,
}

impl ScriptStep {
    pub fn into_transaction(self) -> Transaction {
        Transaction::new(self.request, self.signers)
    }
}

/// Read and parse a script file.
pub fn load_script(path: &Path) -> Result<Vec<ScriptStep>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse script {}", path.display()))
}

/// Load the engine configuration, falling back to defaults when no file is
/// given.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cold_storage_protocol::crypto::HashAlgorithm;
    use std::io::Write;

    #[test]
    fn parses_script_steps() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{ "signers": ["0x01"], "request": {{ "type": "setup", "owner": "0x01",
                   "public_key_a": "{a}", "public_key_b": "{b}" }} }},
                {{ "request": {{ "type": "deposit", "owner": "0x01", "amount": "10.0" }} }},
                {{ "request": {{ "type": "get_balance", "owner": "0x01" }} }}
            ]"#,
            a = "11".repeat(32),
            b = "22".repeat(32),
        )
        .unwrap();

        let steps = load_script(file.path()).unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].signers, vec!["0x01".parse::<AccountId>().unwrap()]);
        assert!(steps[1].signers.is_empty());
        assert!(matches!(steps[1].request, VaultRequest::Deposit { .. }));

        let tx = steps[0].clone().into_transaction();
        assert!(tx.is_signed_by(&"0x01".parse().unwrap()));
    }

    #[test]
    fn bad_script_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = load_script(file.path()).unwrap_err();
        assert!(err.to_string().contains("failed to parse script"));
    }

    #[test]
    fn missing_config_uses_defaults() {
        assert_eq!(load_engine_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn config_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "domain_tag": "custody-staging", "default_hash_algorithm": "BLAKE3" }}"#
        )
        .unwrap();
        let config = load_engine_config(Some(file.path())).unwrap();
        assert_eq!(config.domain_tag.as_str(), "custody-staging");
        assert_eq!(config.default_hash_algorithm, HashAlgorithm::Blake3);
    }
}
