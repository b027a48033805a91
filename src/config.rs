//! Scheme configuration shared by clients and the vault.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest domain tag the hash-to-curve expander accepts, in bytes.
pub const MAX_HASH_DOMAIN_LEN: usize = 255;

/// Domain separation tag for hashing keywords onto G1.
pub const DEFAULT_HASH_DOMAIN: &str = "SEARCHABLE-VAULT-V01-CS01-with-BLS12381G1_XMD:SHA-256_SSWU_RO_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of the random plaintext token stored with each index entry.
    pub index_token_length: usize,
    /// Length of the pseudonym the vault assigns to a new record.
    pub pseudonym_length: usize,
    /// Domain separation tag for keyword hashing, 1 to 255 bytes.
    pub hash_domain: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_token_length: 16,
            pseudonym_length: 16,
            hash_domain: DEFAULT_HASH_DOMAIN.to_string(),
        }
    }
}

impl Config {
    /// Parses a TOML document. Missing keys fall back to their defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use searchable_vault::Config;
    ///
    /// let config = Config::from_toml("pseudonym_length = 24").unwrap();
    /// assert_eq!(config.pseudonym_length, 24);
    /// assert_eq!(config.index_token_length, 16);
    /// ```
    pub fn from_toml(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_token_length == 0 {
            return Err(Error::Config("index_token_length must be positive".into()));
        }
        if self.pseudonym_length == 0 {
            return Err(Error::Config("pseudonym_length must be positive".into()));
        }
        if self.hash_domain.is_empty() {
            return Err(Error::Config("hash_domain must not be empty".into()));
        }
        if self.hash_domain.len() > MAX_HASH_DOMAIN_LEN {
            return Err(Error::Config(format!(
                "hash_domain is {} bytes, at most {MAX_HASH_DOMAIN_LEN} allowed",
                self.hash_domain.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_toml("index_token_length = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_toml("hash_domain = \"\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_toml("pseudonym_length = \"long\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_hash_domain_length_limit() {
        let mut config = Config {
            hash_domain: "a".repeat(MAX_HASH_DOMAIN_LEN),
            ..Config::default()
        };
        config.validate().unwrap();

        config.hash_domain.push('a');
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let toml = format!("hash_domain = \"{}\"", "a".repeat(300));
        assert!(matches!(Config::from_toml(&toml), Err(Error::Config(_))));
    }
}
