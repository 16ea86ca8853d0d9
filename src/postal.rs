// Postal code (CEP) lookups. There is no fallback here, every failure reaches
// the caller.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    cache::{create_cache_key, CacheConfig, TimedCache},
    clock::Clock,
    config::ProviderConfig,
    error::ApiError,
    http::{get_json, Fetch},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub cep: String,
    pub state: String,
    pub city: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
}

/// Strip everything but digits and require exactly eight of them.
pub fn normalize_cep(raw: &str) -> Result<String, ApiError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 8 {
        Ok(digits)
    } else {
        Err(ApiError::InvalidInput(format!(
            "CEP must have 8 digits, got '{}'",
            raw.trim()
        )))
    }
}

pub fn format_cep(cep: &str) -> String {
    if cep.len() == 8 && cep.is_ascii() {
        format!("{}-{}", &cep[..5], &cep[5..])
    } else {
        cep.to_string()
    }
}

pub struct PostalService {
    fetcher: Arc<dyn Fetch>,
    config: ProviderConfig,
    cache: TimedCache<Address>,
}

impl PostalService {
    pub fn new(fetcher: Arc<dyn Fetch>, config: ProviderConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            cache: TimedCache::with_config(CacheConfig::with_ttl(config.cache_ttl), clock),
            config,
        }
    }

    pub async fn lookup(&self, raw: &str) -> Result<Address, ApiError> {
        let cep = normalize_cep(raw)?;
        let key = create_cache_key("cep", &[&cep]);
        if let Some(address) = self.cache.get(&key) {
            return Ok(address);
        }

        let url = format!("{}/{}", self.config.base_url, cep);
        let address: Address = get_json(self.fetcher.as_ref(), &url).await?;
        self.cache.set(key, address.clone());
        Ok(address)
    }
}
