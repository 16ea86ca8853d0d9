// National holidays by year.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    cache::{create_cache_key, CacheConfig, TimedCache},
    clock::Clock,
    config::ProviderConfig,
    error::ApiError,
    http::{get_json, Fetch},
    sourced::{or_fallback, Sourced},
};

pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1900..=2199;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

const FIXED_HOLIDAYS: &[(u32, u32, &str)] = &[
    (1, 1, "Confraternização Universal"),
    (4, 21, "Tiradentes"),
    (5, 1, "Dia do Trabalho"),
    (9, 7, "Independência do Brasil"),
    (10, 12, "Nossa Senhora Aparecida"),
    (11, 2, "Finados"),
    (11, 15, "Proclamação da República"),
    (11, 20, "Dia Nacional de Zumbi e da Consciência Negra"),
    (12, 25, "Natal"),
];

/// Fixed-date national holidays; movable feasts (Carnaval, Good Friday) are
/// only known through the provider.
pub fn fallback_holidays(year: i32) -> Vec<Holiday> {
    FIXED_HOLIDAYS
        .iter()
        .filter_map(|&(month, day, name)| {
            NaiveDate::from_ymd_opt(year, month, day).map(|date| Holiday {
                date,
                name: name.to_string(),
                kind: "national".to_string(),
            })
        })
        .collect()
}

pub struct HolidayService {
    fetcher: Arc<dyn Fetch>,
    config: ProviderConfig,
    cache: TimedCache<Vec<Holiday>>,
}

impl HolidayService {
    pub fn new(fetcher: Arc<dyn Fetch>, config: ProviderConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            cache: TimedCache::with_config(CacheConfig::with_ttl(config.cache_ttl), clock),
            config,
        }
    }

    pub async fn holidays(&self, year: i32) -> Result<Sourced<Vec<Holiday>>, ApiError> {
        if !SUPPORTED_YEARS.contains(&year) {
            return Err(ApiError::InvalidInput(format!("year {year} out of range")));
        }

        let key = create_cache_key("holidays", &[&year.to_string()]);
        if let Some(holidays) = self.cache.get(&key) {
            return Ok(Sourced::Live(holidays));
        }

        let url = format!("{}/{}", self.config.base_url, year);
        let result = get_json::<Vec<Holiday>>(self.fetcher.as_ref(), &url)
            .await
            .map(|mut holidays| {
                holidays.sort_by_key(|h| h.date);
                holidays
            });

        if let Ok(holidays) = &result {
            self.cache.set(key, holidays.clone());
        }
        or_fallback("holidays", result, || fallback_holidays(year))
    }

    /// Next `limit` holidays on or after `from`, looking into the following year
    /// when the current one runs out.
    pub async fn upcoming(&self, from: NaiveDate, limit: usize) -> Result<Sourced<Vec<Holiday>>, ApiError> {
        let this_year = self.holidays(from.year()).await?;
        let mut fell_back = this_year.is_fallback();

        let mut upcoming: Vec<Holiday> = this_year
            .into_inner()
            .into_iter()
            .filter(|h| h.date >= from)
            .take(limit)
            .collect();

        if upcoming.len() < limit && SUPPORTED_YEARS.contains(&(from.year() + 1)) {
            let next_year = self.holidays(from.year() + 1).await?;
            fell_back |= next_year.is_fallback();
            let missing = limit - upcoming.len();
            upcoming.extend(next_year.into_inner().into_iter().take(missing));
        }

        Ok(if fell_back {
            Sourced::Fallback(upcoming)
        } else {
            Sourced::Live(upcoming)
        })
    }

    pub async fn is_holiday(&self, date: NaiveDate) -> Result<Sourced<Option<Holiday>>, ApiError> {
        Ok(self
            .holidays(date.year())
            .await?
            .map(|holidays| holidays.into_iter().find(|h| h.date == date)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::http::mock::MockFetcher;
    use serde_json::json;
    use std::time::Duration;

    const BASE: &str = "https://holidays.test/feriados/v1";

    fn service(fetcher: Arc<MockFetcher>) -> HolidayService {
        HolidayService::new(
            fetcher,
            ProviderConfig {
                base_url: BASE.to_string(),
                cache_ttl: Duration::from_secs(3600),
            },
            Arc::new(SystemClock),
        )
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn body_2025() -> serde_json::Value {
        json!([
            {"date": "2025-12-25", "name": "Natal", "type": "national"},
            {"date": "2025-01-01", "name": "Confraternização mundial", "type": "national"},
            {"date": "2025-03-04", "name": "Carnaval", "type": "national"},
            {"date": "2025-04-18", "name": "Sexta-feira Santa", "type": "national"}
        ])
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond_json(&format!("{BASE}/2025"), &body_2025());
        let service = service(fetcher.clone());

        let first = service.holidays(2025).await.unwrap();
        let second = service.holidays(2025).await.unwrap();

        assert!(first.is_live());
        assert_eq!(first, second);
        assert_eq!(fetcher.calls_to(&format!("{BASE}/2025")), 1);
        // sorted by date
        assert_eq!(first.value()[0].date, ymd(2025, 1, 1));
        assert_eq!(first.value()[0].kind, "national");
    }

    #[tokio::test]
    async fn test_failure_serves_fixed_dates() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail(BASE, ApiError::Network("dns".into()));

        let holidays = service(fetcher).holidays(2026).await.unwrap();
        assert!(holidays.is_fallback());
        assert_eq!(holidays.value().len(), 9);
        assert!(holidays
            .value()
            .iter()
            .any(|h| h.date == ymd(2026, 4, 21) && h.name == "Tiradentes"));
    }

    #[tokio::test]
    async fn test_out_of_range_year_is_rejected_locally() {
        let fetcher = Arc::new(MockFetcher::new());
        let result = service(fetcher.clone()).holidays(1492).await;

        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_upcoming_spills_into_next_year() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond_json(&format!("{BASE}/2025"), &body_2025());
        fetcher.respond_json(
            &format!("{BASE}/2026"),
            &json!([
                {"date": "2026-01-01", "name": "Confraternização mundial", "type": "national"},
                {"date": "2026-02-17", "name": "Carnaval", "type": "national"}
            ]),
        );
        let service = service(fetcher);

        let upcoming = service.upcoming(ymd(2025, 12, 1), 3).await.unwrap();
        assert!(upcoming.is_live());
        let names: Vec<_> = upcoming.value().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Natal", "Confraternização mundial", "Carnaval"]);
    }

    #[tokio::test]
    async fn test_upcoming_marks_partial_fallback() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond_json(&format!("{BASE}/2025"), &body_2025());
        let service = service(fetcher);

        let upcoming = service.upcoming(ymd(2025, 12, 26), 2).await.unwrap();
        assert!(upcoming.is_fallback());
        assert_eq!(upcoming.value()[0].date, ymd(2026, 1, 1));
    }

    #[tokio::test]
    async fn test_is_holiday() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond_json(&format!("{BASE}/2025"), &body_2025());
        let service = service(fetcher);

        let carnaval = service.is_holiday(ymd(2025, 3, 4)).await.unwrap();
        assert_eq!(carnaval.value().as_ref().map(|h| h.name.as_str()), Some("Carnaval"));
        assert!(service.is_holiday(ymd(2025, 3, 5)).await.unwrap().value().is_none());
    }
}
