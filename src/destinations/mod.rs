// Destination listing: municipalities from the locality provider narrowed to
// known major destinations, with coordinates and a short description.

pub mod describe;
pub mod geo;

use std::{collections::HashSet, sync::Arc};

use serde::Serialize;

use crate::{
    error::ApiError,
    fuzzy::{fold, same_place},
    localities::{normalize_state, LocalityService, Municipality},
    sourced::Sourced,
    weather::{WeatherReport, WeatherService},
};

use self::{describe::describe, geo::GeoPoint};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    pub name: String,
    pub state: String,
    pub point: Option<GeoPoint>,
    pub capital: bool,
    pub description: String,
    pub weather: Option<WeatherReport>,
}

pub struct DestinationService {
    localities: Arc<LocalityService>,
    weather: Arc<WeatherService>,
}

impl DestinationService {
    pub fn new(localities: Arc<LocalityService>, weather: Arc<WeatherService>) -> Self {
        Self { localities, weather }
    }

    pub async fn major_destinations(&self, uf: &str) -> Result<Sourced<Vec<Destination>>, ApiError> {
        let uf = normalize_state(uf)?;
        let cities = self.localities.municipalities(&uf).await?;
        let majors: Vec<_> = geo::places_in(&uf).collect();
        let mut seen = HashSet::new();

        Ok(cities.map(|cities| {
            cities
                .iter()
                .filter_map(|city| {
                    let place = majors.iter().find(|p| same_place(p.name, &city.name))?;
                    if !seen.insert(place.name) {
                        return None;
                    }
                    Some(Destination {
                        name: city.name.clone(),
                        state: uf.clone(),
                        point: Some(place.point),
                        capital: place.capital,
                        description: describe(&city.name, &uf, place.capital, None),
                        weather: None,
                    })
                })
                .collect()
        }))
    }

    /// One destination with current weather. Falls back when the weather did.
    pub async fn spotlight(&self, city: &str, uf: &str) -> Result<Sourced<Destination>, ApiError> {
        let uf = normalize_state(uf)?;
        let place = geo::lookup(city, Some(&uf));
        let weather = self.weather.current(city).await?;
        let fell_back = weather.is_fallback();
        let report = weather.into_inner();

        let name = place.map_or_else(|| city.trim().to_string(), |p| p.name.to_string());
        let capital = place.map_or(false, |p| p.capital);
        let destination = Destination {
            description: describe(&name, &uf, capital, Some(&report)),
            name,
            state: uf,
            point: place.map(|p| p.point),
            capital,
            weather: Some(report),
        };

        Ok(if fell_back {
            Sourced::Fallback(destination)
        } else {
            Sourced::Live(destination)
        })
    }

    /// Municipalities of `uf` whose name contains or resembles `query`.
    pub async fn search(&self, query: &str, uf: &str) -> Result<Sourced<Vec<Municipality>>, ApiError> {
        let wanted = fold(query);
        if wanted.is_empty() {
            return Err(ApiError::InvalidInput("search query is empty".to_string()));
        }

        let cities = self.localities.municipalities(uf).await?;
        Ok(cities.map(|cities| {
            cities
                .into_iter()
                .filter(|m| fold(&m.name).contains(&wanted) || same_place(&m.name, query))
                .collect()
        }))
    }
}
