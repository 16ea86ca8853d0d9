// Current conditions and daily forecast from a timeline-forecast provider.
// Every request goes through the shared RequestGate.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    cache::{create_cache_key, CacheConfig, TimedCache},
    clock::Clock,
    config::WeatherConfig,
    error::ApiError,
    fuzzy::fold,
    gate::{GateStatus, RequestGate},
    http::{get_json, Fetch},
    sourced::{or_fallback, Sourced},
};

pub const MAX_FORECAST_DAYS: usize = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    pub temp: f64,
    pub feels_like: f64,
    pub condition: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub precip_probability: f64,
    pub condition: String,
    pub icon: String,
}

#[derive(Debug, Clone)]
struct Timeline {
    current: WeatherReport,
    days: Vec<DailyForecast>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineResponse {
    #[serde(default)]
    resolved_address: Option<String>,
    current_conditions: Option<RawConditions>,
    #[serde(default)]
    days: Vec<RawDay>,
}

#[derive(Debug, Deserialize)]
struct RawConditions {
    temp: f64,
    feelslike: Option<f64>,
    #[serde(default)]
    humidity: f64,
    #[serde(default)]
    windspeed: f64,
    #[serde(default)]
    conditions: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct RawDay {
    datetime: NaiveDate,
    tempmax: f64,
    tempmin: f64,
    #[serde(default)]
    precipprob: Option<f64>,
    #[serde(default)]
    conditions: String,
    #[serde(default)]
    icon: String,
}

impl TimelineResponse {
    fn into_timeline(self, city: &str) -> Result<Timeline, ApiError> {
        let raw = self
            .current_conditions
            .ok_or_else(|| ApiError::Decode("timeline response without currentConditions".to_string()))?;

        let current = WeatherReport {
            city: self
                .resolved_address
                .and_then(|a| a.split(',').next().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| city.to_string()),
            temp: raw.temp,
            feels_like: raw.feelslike.unwrap_or(raw.temp),
            condition: raw.conditions,
            humidity: raw.humidity,
            wind_speed: raw.windspeed,
            icon: raw.icon,
        };

        let days = self
            .days
            .into_iter()
            .map(|d| DailyForecast {
                date: d.datetime,
                temp_max: d.tempmax,
                temp_min: d.tempmin,
                precip_probability: d.precipprob.unwrap_or_default(),
                condition: d.conditions,
                icon: d.icon,
            })
            .collect();

        Ok(Timeline { current, days })
    }
}

/// Display glyph for a provider icon code.
pub fn weather_icon(code: &str) -> &'static str {
    match code {
        "clear-day" => "☀️",
        "clear-night" => "🌙",
        "partly-cloudy-day" | "partly-cloudy-night" => "⛅",
        "cloudy" => "☁️",
        "rain" | "showers-day" | "showers-night" => "🌧️",
        "thunder-rain" | "thunder-showers-day" | "thunder-showers-night" => "⛈️",
        "fog" => "🌫️",
        "wind" => "💨",
        "snow" => "❄️",
        _ => "🌡️",
    }
}

// (city, temp, condition, humidity, wind, icon)
const FALLBACK_WEATHER: &[(&str, f64, &str, f64, f64, &str)] = &[
    ("Rio de Janeiro", 28.0, "Partly cloudy", 75.0, 15.0, "partly-cloudy-day"),
    ("São Paulo", 22.0, "Cloudy", 70.0, 10.0, "cloudy"),
    ("Salvador", 29.0, "Sunny", 78.0, 18.0, "clear-day"),
    ("Brasília", 25.0, "Clear", 55.0, 12.0, "clear-day"),
    ("Florianópolis", 21.0, "Partly cloudy", 72.0, 20.0, "partly-cloudy-day"),
    ("Manaus", 31.0, "Rain", 85.0, 8.0, "rain"),
];

/// Embedded conditions served when the provider cannot be reached.
pub fn fallback_report(city: &str) -> WeatherReport {
    let wanted = fold(city);
    let (name, temp, condition, humidity, wind, icon) = FALLBACK_WEATHER
        .iter()
        .copied()
        .find(|entry| fold(entry.0) == wanted)
        .unwrap_or((city, 25.0, "Clear", 65.0, 10.0, "clear-day"));

    WeatherReport {
        city: name.to_string(),
        temp,
        feels_like: temp,
        condition: condition.to_string(),
        humidity,
        wind_speed: wind,
        icon: icon.to_string(),
    }
}

pub fn fallback_forecast(city: &str, start: NaiveDate, days: usize) -> Vec<DailyForecast> {
    let base = fallback_report(city);
    (0..days)
        .filter_map(|offset| start.checked_add_days(Days::new(offset as u64)))
        .map(|date| DailyForecast {
            date,
            temp_max: base.temp + 3.0,
            temp_min: base.temp - 4.0,
            precip_probability: 20.0,
            condition: base.condition.clone(),
            icon: base.icon.clone(),
        })
        .collect()
}

pub struct WeatherService {
    fetcher: Arc<dyn Fetch>,
    gate: RequestGate,
    config: WeatherConfig,
    clock: Arc<dyn Clock>,
    current_cache: TimedCache<WeatherReport>,
    forecast_cache: TimedCache<Vec<DailyForecast>>,
}

impl WeatherService {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        gate: RequestGate,
        config: WeatherConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache_config = CacheConfig::with_ttl(config.cache_ttl);
        Self {
            fetcher,
            gate,
            current_cache: TimedCache::with_config(cache_config.clone(), clock.clone()),
            forecast_cache: TimedCache::with_config(cache_config, clock.clone()),
            config,
            clock,
        }
    }

    fn timeline_url(&self, city: &str) -> String {
        format!(
            "{}/{}?unitGroup={}&include=current%2Cdays&key={}&contentType=json",
            self.config.base_url,
            urlencoding::encode(&format!("{city}, Brasil")),
            urlencoding::encode(&self.config.unit_group),
            urlencoding::encode(&self.config.api_key),
        )
    }

    fn city_key(city: &str) -> Result<String, ApiError> {
        let folded = fold(city);
        if folded.is_empty() {
            return Err(ApiError::InvalidInput("city name is empty".to_string()));
        }
        Ok(folded.replace(' ', "-"))
    }

    async fn fetch_timeline(&self, city: &str, key: &str) -> Result<Timeline, ApiError> {
        if self.config.api_key.is_empty() {
            return Err(ApiError::Status {
                status_code: 401,
                message: "weather API key not configured".to_string(),
            });
        }

        let url = self.timeline_url(city);
        let fetcher = self.fetcher.clone();
        let timeout = self.config.request_timeout;
        let city_name = city.trim().to_string();

        let timeline = self
            .gate
            .submit(move || async move {
                let response = tokio::time::timeout(
                    timeout,
                    get_json::<TimelineResponse>(fetcher.as_ref(), &url),
                )
                .await
                .map_err(|_| ApiError::Timeout(timeout.as_millis() as u64))??;
                response.into_timeline(&city_name)
            })
            .await?;

        self.current_cache
            .set(create_cache_key("weather", &[key]), timeline.current.clone());
        self.forecast_cache
            .set(create_cache_key("forecast", &[key]), timeline.days.clone());
        Ok(timeline)
    }

    pub async fn current(&self, city: &str) -> Result<Sourced<WeatherReport>, ApiError> {
        let key = Self::city_key(city)?;
        if let Some(report) = self.current_cache.get(&create_cache_key("weather", &[&key])) {
            return Ok(Sourced::Live(report));
        }

        let result = self.fetch_timeline(city, &key).await.map(|t| t.current);
        or_fallback("weather", result, || fallback_report(city.trim()))
    }

    pub async fn forecast(&self, city: &str, days: usize) -> Result<Sourced<Vec<DailyForecast>>, ApiError> {
        let key = Self::city_key(city)?;
        let days = days.clamp(1, MAX_FORECAST_DAYS);

        let cached = self.forecast_cache.get(&create_cache_key("forecast", &[&key]));
        let result = match cached {
            Some(forecast) => Ok(forecast),
            None => self.fetch_timeline(city, &key).await.map(|t| t.days),
        };

        let today = self.clock.today();
        or_fallback("forecast", result, || fallback_forecast(city.trim(), today, days))
            .map(|sourced| sourced.map(|forecast| forecast.into_iter().take(days).collect()))
    }

    pub fn quota_status(&self) -> GateStatus {
        self.gate.status()
    }

    pub fn clear_cache(&self) {
        info!("clearing weather cache");
        self.current_cache.clear();
        self.forecast_cache.clear();
    }
}
