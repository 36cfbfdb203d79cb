// Credential storage
//
// API keys are resolved from:
// 1. System keychain (preferred)
// 2. Environment variable (fallback for CI/headless)
// and can be loaded from a local text file (key.txt drop-in).
//
// Keys are NEVER stored in settings.json

use std::env;
use std::path::Path;

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "gridpilot";

/// Keychain account holding the model API key
const KEYCHAIN_ACCOUNT: &str = "ai/api-key";

/// Environment variable fallback
pub const KEY_ENV_VAR: &str = "GRIDPILOT_API_KEY";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from environment variable
    Environment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Get the stored API key.
///
/// Checks in order:
/// 1. System keychain
/// 2. Environment variable (GRIDPILOT_API_KEY)
pub fn get_api_key() -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    if let Ok(key) = env::var(KEY_ENV_VAR) {
        if !key.trim().is_empty() {
            return KeyLookup {
                key: Some(key.trim().to_string()),
                source: KeySource::Environment,
            };
        }
    }

    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Store an API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_key: &str) -> Result<(), String> {
    Err(format!(
        "Keychain support not enabled. Set {} environment variable instead.",
        KEY_ENV_VAR
    ))
}

/// Delete the API key from the system keychain
#[cfg(feature = "keychain")]
pub fn delete_api_key() -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, KEYCHAIN_ACCOUNT)
        .map_err(|e| format!("Failed to access keychain entry: {}", e))?;

    entry
        .delete_credential()
        .map_err(|e| format!("Failed to delete key from keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn delete_api_key() -> Result<(), String> {
    Err("Keychain support not enabled.".to_string())
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

/// Load a credential from a local text file (the key.txt drop). The file
/// content is trimmed; an empty file is an error. "Non-empty" is the
/// only validation a credential gets.
pub fn load_key_file(path: &Path) -> Result<String, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read key file {}: {}", path.display(), e))?;
    let key = content.trim().to_string();
    if key.is_empty() {
        return Err(format!("key file {} is empty", path.display()));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "  AIza-test-key-123  ").unwrap();

        let key = load_key_file(&path).unwrap();
        assert_eq!(key, "AIza-test-key-123");
    }

    #[test]
    fn test_load_key_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key.txt");
        std::fs::write(&path, "   \n").unwrap();

        let err = load_key_file(&path).unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn test_load_key_file_missing() {
        let err = load_key_file(Path::new("/nonexistent/key.txt")).unwrap_err();
        assert!(err.contains("cannot read"));
    }

    #[test]
    fn test_key_source_labels() {
        assert_eq!(KeySource::Keychain.as_str(), "keychain");
        assert_eq!(KeySource::Environment.as_str(), "environment");
        assert_eq!(KeySource::None.as_str(), "none");
    }
}
