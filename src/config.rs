use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{error::ConfigError, gate::GateConfig};

const HOUR: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: String,
    pub unit_group: String,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub gate: GateConfig,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline"
                .to_string(),
            api_key: String::new(),
            unit_group: "metric".to_string(),
            cache_ttl: Duration::from_secs(30 * 60),
            request_timeout: Duration::from_secs(8),
            gate: GateConfig::default(),
        }
    }
}

// Base URL plus cache lifetime for the keyless providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub cache_ttl: Duration,
}

impl ProviderConfig {
    fn new(base_url: &str, cache_ttl: Duration) -> Self {
        Self {
            base_url: base_url.to_string(),
            cache_ttl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub weather: WeatherConfig,
    pub holidays: ProviderConfig,
    pub countries: ProviderConfig,
    pub localities: ProviderConfig,
    pub stations: ProviderConfig,
    pub postal: ProviderConfig,
    pub http_timeout: Duration,
    // where the weather quota is persisted, in memory when unset
    pub state_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig::default(),
            holidays: ProviderConfig::new("https://brasilapi.com.br/api/feriados/v1", 24 * HOUR),
            countries: ProviderConfig::new("https://restcountries.com/v3.1", 24 * HOUR),
            localities: ProviderConfig::new(
                "https://servicodados.ibge.gov.br/api/v1/localidades",
                24 * HOUR,
            ),
            stations: ProviderConfig::new("https://brasilapi.com.br/api/cptec/v1/cidade", 24 * HOUR),
            postal: ProviderConfig::new("https://brasilapi.com.br/api/cep/v1", 24 * HOUR),
            http_timeout: Duration::from_secs(10),
            state_file: None,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by whichever environment variables are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(key) = lookup("WEATHER_API_KEY") {
            config.weather.api_key = key;
        }
        if let Some(url) = lookup("WEATHER_BASE_URL") {
            config.weather.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(quota) = parse_var(&lookup, "WEATHER_DAILY_QUOTA")? {
            config.weather.gate.daily_quota = quota;
        }
        if let Some(max) = parse_var::<usize>(&lookup, "WEATHER_MAX_CONCURRENT")? {
            if max == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "WEATHER_MAX_CONCURRENT".to_string(),
                    value: "0".to_string(),
                });
            }
            config.weather.gate.max_concurrent = max;
        }
        if let Some(ms) = parse_var(&lookup, "WEATHER_MIN_DELAY_MS")? {
            config.weather.gate.min_delay = Duration::from_millis(ms);
        }
        if let Some(path) = lookup("VIAGEM_STATE_FILE") {
            config.state_file = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.weather.gate.max_concurrent, 2);
        assert_eq!(config.weather.gate.min_delay, Duration::from_millis(1000));
        assert_eq!(config.weather.gate.daily_quota, 1000);
        assert_eq!(config.weather.unit_group, "metric");
        assert!(config.state_file.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("WEATHER_API_KEY", "secret"),
            ("WEATHER_DAILY_QUOTA", "50"),
            ("WEATHER_MAX_CONCURRENT", "3"),
            ("WEATHER_MIN_DELAY_MS", "250"),
            ("WEATHER_BASE_URL", "http://localhost:9000/timeline/"),
            ("VIAGEM_STATE_FILE", "/tmp/viagem.json"),
        ]))
        .unwrap();

        assert_eq!(config.weather.api_key, "secret");
        assert_eq!(config.weather.gate.daily_quota, 50);
        assert_eq!(config.weather.gate.max_concurrent, 3);
        assert_eq!(config.weather.gate.min_delay, Duration::from_millis(250));
        assert_eq!(config.weather.base_url, "http://localhost:9000/timeline");
        assert_eq!(config.state_file, Some(PathBuf::from("/tmp/viagem.json")));
    }

    #[test]
    fn test_malformed_number_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("WEATHER_DAILY_QUOTA", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "WEATHER_DAILY_QUOTA"));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("WEATHER_MAX_CONCURRENT", "0")])).is_err());
    }
}
