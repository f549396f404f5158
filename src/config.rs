//! Adapter configuration (§6 "Configuration (adapter init)").

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};

/// Initialization parameters for the crypto adapter.
///
/// Mirrors `crypto_adapter_params_t` from the C core: `use_pq_crypto`,
/// `use_hybrid`, and an optional key-storage path. The storage path is
/// carried as configuration only — the storage collaborator itself is out
/// of scope (§1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub use_pq_crypto: bool,
    pub use_hybrid: bool,
    pub key_storage_path: Option<PathBuf>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            use_pq_crypto: true,
            use_hybrid: true,
            key_storage_path: None,
        }
    }
}

impl AdapterConfig {
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }

    /// Rejects `use_pq_crypto=false` combined with `use_hybrid=true` (§6).
    pub fn validate(&self) -> CoreResult<()> {
        if !self.use_pq_crypto && self.use_hybrid {
            return Err(CoreError::InvalidArgument(
                "use_hybrid requires use_pq_crypto",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct AdapterConfigBuilder {
    use_pq_crypto: Option<bool>,
    use_hybrid: Option<bool>,
    key_storage_path: Option<PathBuf>,
}

impl AdapterConfigBuilder {
    pub fn use_pq_crypto(mut self, value: bool) -> Self {
        self.use_pq_crypto = Some(value);
        self
    }

    pub fn use_hybrid(mut self, value: bool) -> Self {
        self.use_hybrid = Some(value);
        self
    }

    pub fn key_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_storage_path = Some(path.into());
        self
    }

    pub fn build(self) -> CoreResult<AdapterConfig> {
        let config = AdapterConfig {
            use_pq_crypto: self.use_pq_crypto.unwrap_or(true),
            use_hybrid: self.use_hybrid.unwrap_or(true),
            key_storage_path: self.key_storage_path,
        };
        config.validate()?;
        Ok(config)
    }
}
