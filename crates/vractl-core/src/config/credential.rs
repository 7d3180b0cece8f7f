//! Credential storage with optional OS keyring support
//!
//! Profile fields may hold a plaintext value or a `keyring:<key>` reference.
//! References are resolved through the OS keyring when the `secure-storage`
//! feature is enabled.

use super::error::{ConfigError, Result};

/// Prefix that marks a value stored in the keyring
pub const KEYRING_PREFIX: &str = "keyring:";

#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "vractl";

/// Resolves and stores profile secrets
#[derive(Debug, Default, Clone, Copy)]
pub struct CredentialStore;

impl CredentialStore {
    pub fn new() -> Self {
        Self
    }

    /// Whether `value` points into the keyring
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Resolve a stored value to the secret it stands for
    pub fn resolve(&self, value: &str) -> Result<String> {
        let Some(key) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(value.to_string());
        };

        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, key)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            entry.get_password().map_err(|e| {
                ConfigError::KeyringError(format!(
                    "Failed to retrieve credential '{}' from keyring: {}",
                    key, e
                ))
            })
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            Err(ConfigError::CredentialError(format!(
                "Credential '{}' is stored in the keyring but the secure-storage feature is not enabled",
                key
            )))
        }
    }

    /// Store a secret in the keyring and return the reference to save in the config
    pub fn store(&self, key: &str, secret: &str) -> Result<String> {
        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, key)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            entry.set_password(secret).map_err(|e| {
                ConfigError::KeyringError(format!("Failed to store credential in keyring: {}", e))
            })?;
            Ok(format!("{}{}", KEYRING_PREFIX, key))
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            let _ = (key, secret);
            Err(ConfigError::CredentialError(
                "Keyring storage requires the secure-storage feature".to_string(),
            ))
        }
    }

    /// Remove a keyring entry if `value` is a reference; plaintext values are ignored
    pub fn forget(&self, value: &str) -> Result<()> {
        let Some(key) = value.strip_prefix(KEYRING_PREFIX) else {
            return Ok(());
        };

        #[cfg(feature = "secure-storage")]
        {
            let entry = keyring::Entry::new(SERVICE_NAME, key)
                .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(ConfigError::KeyringError(format!(
                    "Failed to delete credential from keyring: {}",
                    e
                ))),
            }
        }
        #[cfg(not(feature = "secure-storage"))]
        {
            let _ = key;
            Ok(())
        }
    }
}
