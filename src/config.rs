use crate::entropy::EntropyMode;
use crate::errors::{ConfigError, QkdError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw positions exchanged when nothing else is configured.
pub const DEFAULT_KEY_LENGTH: usize = 32;

/// Parameters of a protocol run.
///
/// ```toml
/// key_length = 64
/// entropy = "pseudo-random"
/// seed = 7
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QkdConfig {
    pub key_length: usize,
    pub entropy: EntropyMode,
    /// Fixes the entropy stream, for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for QkdConfig {
    fn default() -> Self {
        Self {
            key_length: DEFAULT_KEY_LENGTH,
            entropy: EntropyMode::default(),
            seed: None,
        }
    }
}

impl QkdConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: QkdConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), QkdError> {
        if self.key_length == 0 {
            return Err(QkdError::InvalidKeyLength(self.key_length));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = QkdConfig::from_toml_str("").unwrap();
        assert_eq!(config, QkdConfig::default());
        assert_eq!(config.key_length, DEFAULT_KEY_LENGTH);
        assert_eq!(config.entropy, EntropyMode::Quantum);
    }

    #[test]
    fn parses_all_fields() {
        let config = QkdConfig::from_toml_str(
            "key_length = 64\nentropy = \"pseudo-random\"\nseed = 7\n",
        )
        .unwrap();
        assert_eq!(config.key_length, 64);
        assert_eq!(config.entropy, EntropyMode::PseudoRandom);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn zero_key_length_is_invalid() {
        let err = QkdConfig::from_toml_str("key_length = 0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(QkdError::InvalidKeyLength(0))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = QkdConfig::from_toml_str("use_qrng = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "key_length = 16").unwrap();
        let config = QkdConfig::load(file.path()).unwrap();
        assert_eq!(config.key_length, 16);

        let missing = QkdConfig::load(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
