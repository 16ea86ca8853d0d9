// Country metadata lookups by name or alpha code.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    cache::{create_cache_key, CacheConfig, TimedCache},
    clock::Clock,
    config::ProviderConfig,
    error::ApiError,
    http::{get_json, Fetch},
    sourced::{or_fallback, Sourced},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Country {
    pub common_name: String,
    pub official_name: String,
    pub cca2: String,
    pub cca3: String,
    pub capital: Vec<String>,
    pub region: String,
    pub subregion: String,
    pub population: u64,
    pub area_km2: f64,
    pub currencies: Vec<Currency>,
    pub languages: Vec<String>,
    pub borders: Vec<String>,
    pub flag: String,
}

impl Country {
    pub fn population_density(&self) -> Option<f64> {
        (self.area_km2 > 0.0).then(|| self.population as f64 / self.area_km2)
    }
}

#[derive(Debug, Deserialize)]
struct RawName {
    common: String,
    #[serde(default)]
    official: String,
}

#[derive(Debug, Deserialize)]
struct RawCurrency {
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct RawCountry {
    name: RawName,
    #[serde(default)]
    cca2: String,
    #[serde(default)]
    cca3: String,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    region: String,
    #[serde(default)]
    subregion: String,
    #[serde(default)]
    population: u64,
    #[serde(default)]
    area: f64,
    #[serde(default)]
    currencies: BTreeMap<String, RawCurrency>,
    #[serde(default)]
    languages: BTreeMap<String, String>,
    #[serde(default)]
    borders: Vec<String>,
    #[serde(default)]
    flag: String,
}

impl From<RawCountry> for Country {
    fn from(raw: RawCountry) -> Self {
        Self {
            common_name: raw.name.common,
            official_name: raw.name.official,
            cca2: raw.cca2,
            cca3: raw.cca3,
            capital: raw.capital,
            region: raw.region,
            subregion: raw.subregion,
            population: raw.population,
            area_km2: raw.area,
            currencies: raw
                .currencies
                .into_iter()
                .map(|(code, c)| Currency {
                    code,
                    name: c.name,
                    symbol: c.symbol,
                })
                .collect(),
            languages: raw.languages.into_values().collect(),
            borders: raw.borders,
            flag: raw.flag,
        }
    }
}

pub fn fallback_brazil() -> Country {
    Country {
        common_name: "Brazil".to_string(),
        official_name: "Federative Republic of Brazil".to_string(),
        cca2: "BR".to_string(),
        cca3: "BRA".to_string(),
        capital: vec!["Brasília".to_string()],
        region: "Americas".to_string(),
        subregion: "South America".to_string(),
        population: 212_559_409,
        area_km2: 8_515_767.0,
        currencies: vec![Currency {
            code: "BRL".to_string(),
            name: "Brazilian real".to_string(),
            symbol: "R$".to_string(),
        }],
        languages: vec!["Portuguese".to_string()],
        borders: ["ARG", "BOL", "COL", "GUF", "GUY", "PRY", "PER", "SUR", "URY", "VEN"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        flag: "🇧🇷".to_string(),
    }
}

fn validate_alpha(code: &str) -> Result<String, ApiError> {
    let code = code.trim();
    if matches!(code.len(), 2 | 3) && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ApiError::InvalidInput(format!(
            "country code must be 2 or 3 letters, got '{code}'"
        )))
    }
}

pub struct CountryService {
    fetcher: Arc<dyn Fetch>,
    config: ProviderConfig,
    cache: TimedCache<Vec<Country>>,
}

impl CountryService {
    pub fn new(fetcher: Arc<dyn Fetch>, config: ProviderConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            cache: TimedCache::with_config(CacheConfig::with_ttl(config.cache_ttl), clock),
            config,
        }
    }

    pub async fn by_name(&self, name: &str) -> Result<Sourced<Vec<Country>>, ApiError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::InvalidInput("country name is empty".to_string()));
        }
        let url = format!("{}/name/{}", self.config.base_url, urlencoding::encode(name));
        self.lookup(create_cache_key("country_name", &[&name.to_lowercase()]), url)
            .await
    }

    pub async fn by_code(&self, code: &str) -> Result<Sourced<Vec<Country>>, ApiError> {
        let code = validate_alpha(code)?;
        let url = format!("{}/alpha/{}", self.config.base_url, code);
        self.lookup(create_cache_key("country_code", &[&code]), url).await
    }

    async fn lookup(&self, key: String, url: String) -> Result<Sourced<Vec<Country>>, ApiError> {
        if let Some(countries) = self.cache.get(&key) {
            return Ok(Sourced::Live(countries));
        }

        let result = get_json::<Vec<RawCountry>>(self.fetcher.as_ref(), &url)
            .await
            .map(|raw| raw.into_iter().map(Country::from).collect::<Vec<_>>());

        if let Ok(countries) = &result {
            self.cache.set(key, countries.clone());
        }
        or_fallback("countries", result, || vec![fallback_brazil()])
    }
}
