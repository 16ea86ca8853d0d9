// Builds every service from explicit collaborators. Nothing in the crate is a
// global; whoever owns an App owns all the caches and the weather gate.

use std::sync::Arc;

use tracing::info;

use crate::{
    clock::{Clock, SystemClock},
    config::AppConfig,
    countries::CountryService,
    destinations::DestinationService,
    error::InitError,
    gate::RequestGate,
    holidays::HolidayService,
    http::{Fetch, ReqwestFetcher},
    localities::LocalityService,
    postal::PostalService,
    store::{JsonFileStore, KeyValueStore, MemoryStore},
    weather::WeatherService,
};

pub struct App {
    pub weather: Arc<WeatherService>,
    pub holidays: HolidayService,
    pub countries: CountryService,
    pub localities: Arc<LocalityService>,
    pub postal: PostalService,
    pub destinations: DestinationService,
}

impl App {
    pub fn new(
        config: AppConfig,
        fetcher: Arc<dyn Fetch>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = RequestGate::new(config.weather.gate.clone(), store, clock.clone());

        let weather = Arc::new(WeatherService::new(
            fetcher.clone(),
            gate,
            config.weather,
            clock.clone(),
        ));
        let localities = Arc::new(LocalityService::new(
            fetcher.clone(),
            config.localities,
            config.stations,
            clock.clone(),
        ));

        Self {
            holidays: HolidayService::new(fetcher.clone(), config.holidays, clock.clone()),
            countries: CountryService::new(fetcher.clone(), config.countries, clock.clone()),
            postal: PostalService::new(fetcher, config.postal, clock),
            destinations: DestinationService::new(localities.clone(), weather.clone()),
            weather,
            localities,
        }
    }

    /// Real HTTP client, system clock, and the quota persisted to
    /// `config.state_file` when one is set.
    pub fn from_config(config: AppConfig) -> Result<Self, InitError> {
        let fetcher = ReqwestFetcher::new(config.http_timeout).map_err(|e| InitError::Http(e.to_string()))?;

        let store: Arc<dyn KeyValueStore> = match &config.state_file {
            Some(path) => {
                let store = JsonFileStore::open(path)?;
                info!(path = %store.path().display(), "persisting weather quota");
                Arc::new(store)
            }
            None => Arc::new(MemoryStore::new()),
        };

        Ok(Self::new(config, Arc::new(fetcher), store, Arc::new(SystemClock)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ApiError;
    use crate::http::mock::MockFetcher;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::time::Duration;

    fn app(fetcher: Arc<MockFetcher>, clock: Arc<ManualClock>) -> App {
        let mut config = AppConfig::default();
        config.weather.api_key = "k".to_string();
        config.weather.gate.min_delay = Duration::ZERO;
        App::new(config, fetcher, Arc::new(MemoryStore::new()), clock)
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::starting_on(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()))
    }

    #[tokio::test]
    async fn test_holidays_fetched_once_within_ttl() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond_json(
            "https://brasilapi.com.br/api/feriados/v1/2025",
            &json!([{"date": "2025-01-01", "name": "Confraternização mundial", "type": "national"}]),
        );
        let clock = clock();
        let app = app(fetcher.clone(), clock.clone());

        assert!(app.holidays.holidays(2025).await.unwrap().is_live());
        clock.advance_millis(60 * 60 * 1000);
        assert!(app.holidays.holidays(2025).await.unwrap().is_live());
        assert_eq!(fetcher.calls_to("https://brasilapi.com.br/api/feriados"), 1);

        // past the 24h ttl the provider is asked again
        clock.advance_millis(24 * 60 * 60 * 1000);
        let _ = app.holidays.holidays(2025).await.unwrap();
        assert_eq!(fetcher.calls_to("https://brasilapi.com.br/api/feriados"), 2);
    }

    #[tokio::test]
    async fn test_weather_exception_yields_rio_fallback() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail(
            "https://weather.visualcrossing.com",
            ApiError::Network("connection reset by peer".into()),
        );
        let app = app(fetcher, clock());

        let report = app.weather.current("Rio de Janeiro").await.unwrap();
        assert!(report.is_fallback());
        assert_eq!(report.value().temp, 28.0);
        assert_eq!(report.value().condition, "Partly cloudy");
        assert_eq!(app.weather.quota_status().used, 0);
    }

    #[tokio::test]
    async fn test_services_share_one_fetcher() {
        let fetcher = Arc::new(MockFetcher::new());
        let app = app(fetcher.clone(), clock());

        let _ = app.localities.states().await.unwrap();
        let _ = app.countries.by_code("BR").await.unwrap();
        let _ = app.postal.lookup("01310100").await;
        assert_eq!(fetcher.total_calls(), 3);
    }
}
