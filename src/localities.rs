// IBGE states and municipalities, plus the CPTEC weather-station city catalog.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    cache::{create_cache_key, CacheConfig, TimedCache},
    clock::Clock,
    config::ProviderConfig,
    destinations::geo,
    error::ApiError,
    http::{get_json, Fetch},
    sourced::{or_fallback, Sourced},
};

/// (IBGE id, code, name, region)
pub const STATES: &[(u32, &str, &str, &str)] = &[
    (12, "AC", "Acre", "Norte"),
    (27, "AL", "Alagoas", "Nordeste"),
    (16, "AP", "Amapá", "Norte"),
    (13, "AM", "Amazonas", "Norte"),
    (29, "BA", "Bahia", "Nordeste"),
    (23, "CE", "Ceará", "Nordeste"),
    (53, "DF", "Distrito Federal", "Centro-Oeste"),
    (32, "ES", "Espírito Santo", "Sudeste"),
    (52, "GO", "Goiás", "Centro-Oeste"),
    (21, "MA", "Maranhão", "Nordeste"),
    (51, "MT", "Mato Grosso", "Centro-Oeste"),
    (50, "MS", "Mato Grosso do Sul", "Centro-Oeste"),
    (31, "MG", "Minas Gerais", "Sudeste"),
    (15, "PA", "Pará", "Norte"),
    (25, "PB", "Paraíba", "Nordeste"),
    (41, "PR", "Paraná", "Sul"),
    (26, "PE", "Pernambuco", "Nordeste"),
    (22, "PI", "Piauí", "Nordeste"),
    (33, "RJ", "Rio de Janeiro", "Sudeste"),
    (24, "RN", "Rio Grande do Norte", "Nordeste"),
    (43, "RS", "Rio Grande do Sul", "Sul"),
    (11, "RO", "Rondônia", "Norte"),
    (14, "RR", "Roraima", "Norte"),
    (42, "SC", "Santa Catarina", "Sul"),
    (35, "SP", "São Paulo", "Sudeste"),
    (28, "SE", "Sergipe", "Nordeste"),
    (17, "TO", "Tocantins", "Norte"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub id: u32,
    pub code: String,
    pub name: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Municipality {
    pub id: u32,
    pub name: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationCity {
    pub id: u32,
    pub name: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct IbgeRegion {
    nome: String,
}

#[derive(Debug, Deserialize)]
struct IbgeState {
    id: u32,
    sigla: String,
    nome: String,
    regiao: IbgeRegion,
}

#[derive(Debug, Deserialize)]
struct IbgeMunicipality {
    id: u32,
    nome: String,
}

#[derive(Debug, Deserialize)]
struct CptecCity {
    id: u32,
    nome: String,
    estado: String,
}

/// Upper-cased state code if it names one of the 27 federative units.
pub fn normalize_state(code: &str) -> Result<String, ApiError> {
    let code = code.trim().to_ascii_uppercase();
    if STATES.iter().any(|s| s.1 == code) {
        Ok(code)
    } else {
        Err(ApiError::InvalidInput(format!("unknown state code '{code}'")))
    }
}

pub fn state_name(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|s| s.1.eq_ignore_ascii_case(code))
        .map(|s| s.2)
}

fn fallback_states() -> Vec<State> {
    STATES
        .iter()
        .map(|&(id, code, name, region)| State {
            id,
            code: code.to_string(),
            name: name.to_string(),
            region: region.to_string(),
        })
        .collect()
}

fn fallback_municipalities(uf: &str) -> Vec<Municipality> {
    geo::places_in(uf)
        .map(|p| Municipality {
            id: 0,
            name: p.name.to_string(),
            state: p.state.to_string(),
        })
        .collect()
}

fn fallback_stations() -> Vec<StationCity> {
    [
        (241, "Rio de Janeiro", "RJ"),
        (244, "São Paulo", "SP"),
        (242, "Salvador", "BA"),
        (61, "Brasília", "DF"),
        (227, "Florianópolis", "SC"),
        (234, "Manaus", "AM"),
        (221, "Recife", "PE"),
        (222, "Belo Horizonte", "MG"),
    ]
    .into_iter()
    .map(|(id, name, state)| StationCity {
        id,
        name: name.to_string(),
        state: state.to_string(),
    })
    .collect()
}

pub struct LocalityService {
    fetcher: Arc<dyn Fetch>,
    ibge: ProviderConfig,
    stations: ProviderConfig,
    states_cache: TimedCache<Vec<State>>,
    municipalities_cache: TimedCache<Vec<Municipality>>,
    stations_cache: TimedCache<Vec<StationCity>>,
}

impl LocalityService {
    pub fn new(
        fetcher: Arc<dyn Fetch>,
        ibge: ProviderConfig,
        stations: ProviderConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            states_cache: TimedCache::with_config(CacheConfig::with_ttl(ibge.cache_ttl), clock.clone()),
            municipalities_cache: TimedCache::with_config(
                CacheConfig::with_ttl(ibge.cache_ttl),
                clock.clone(),
            ),
            stations_cache: TimedCache::with_config(CacheConfig::with_ttl(stations.cache_ttl), clock),
            ibge,
            stations,
        }
    }

    pub async fn states(&self) -> Result<Sourced<Vec<State>>, ApiError> {
        let key = "states";
        if let Some(states) = self.states_cache.get(key) {
            return Ok(Sourced::Live(states));
        }

        let url = format!("{}/estados?orderBy=nome", self.ibge.base_url);
        let result = get_json::<Vec<IbgeState>>(self.fetcher.as_ref(), &url)
            .await
            .map(|raw| {
                raw.into_iter()
                    .map(|s| State {
                        id: s.id,
                        code: s.sigla,
                        name: s.nome,
                        region: s.regiao.nome,
                    })
                    .collect::<Vec<_>>()
            });

        if let Ok(states) = &result {
            self.states_cache.set(key, states.clone());
        }
        or_fallback("states", result, fallback_states)
    }

    pub async fn municipalities(&self, uf: &str) -> Result<Sourced<Vec<Municipality>>, ApiError> {
        let uf = normalize_state(uf)?;
        let key = create_cache_key("cities", &[&uf]);
        if let Some(cities) = self.municipalities_cache.get(&key) {
            return Ok(Sourced::Live(cities));
        }

        let url = format!("{}/estados/{}/municipios?orderBy=nome", self.ibge.base_url, uf);
        let result = get_json::<Vec<IbgeMunicipality>>(self.fetcher.as_ref(), &url)
            .await
            .map(|raw| {
                raw.into_iter()
                    .map(|m| Municipality {
                        id: m.id,
                        name: m.nome,
                        state: uf.clone(),
                    })
                    .collect::<Vec<_>>()
            });

        if let Ok(cities) = &result {
            self.municipalities_cache.set(key, cities.clone());
        }
        or_fallback("municipalities", result, || fallback_municipalities(&uf))
    }

    pub async fn station_cities(&self) -> Result<Sourced<Vec<StationCity>>, ApiError> {
        let key = "stations";
        if let Some(cities) = self.stations_cache.get(key) {
            return Ok(Sourced::Live(cities));
        }

        let result = get_json::<Vec<CptecCity>>(self.fetcher.as_ref(), &self.stations.base_url)
            .await
            .map(|raw| {
                raw.into_iter()
                    .map(|c| StationCity {
                        id: c.id,
                        name: c.nome,
                        state: c.estado,
                    })
                    .collect::<Vec<_>>()
            });

        if let Ok(cities) = &result {
            self.stations_cache.set(key, cities.clone());
        }
        or_fallback("station cities", result, fallback_stations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::AppConfig;
    use crate::http::mock::MockFetcher;
    use serde_json::json;

    fn service(fetcher: Arc<MockFetcher>) -> LocalityService {
        let config = AppConfig::default();
        LocalityService::new(fetcher, config.localities, config.stations, Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn test_states_live_and_cached() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond_json(
            "https://servicodados.ibge.gov.br/api/v1/localidades/estados",
            &json!([
                {"id": 35, "sigla": "SP", "nome": "São Paulo", "regiao": {"id": 3, "sigla": "SE", "nome": "Sudeste"}},
                {"id": 33, "sigla": "RJ", "nome": "Rio de Janeiro", "regiao": {"id": 3, "sigla": "SE", "nome": "Sudeste"}}
            ]),
        );
        let service = service(fetcher.clone());

        let first = service.states().await.unwrap();
        let second = service.states().await.unwrap();

        assert!(first.is_live());
        assert_eq!(first.value().len(), 2);
        assert_eq!(second.value()[0].region, "Sudeste");
        assert_eq!(fetcher.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_states_fallback_has_all_units() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail("https://servicodados", ApiError::Network("offline".into()));

        let states = service(fetcher).states().await.unwrap();
        assert!(states.is_fallback());
        assert_eq!(states.value().len(), 27);
    }

    #[tokio::test]
    async fn test_municipalities_reject_unknown_state_before_request() {
        let fetcher = Arc::new(MockFetcher::new());
        let result = service(fetcher.clone()).municipalities("ZZ").await;

        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_municipalities_keyed_per_state() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond_json(
            "https://servicodados.ibge.gov.br/api/v1/localidades/estados/SP/municipios",
            &json!([{"id": 3550308, "nome": "São Paulo"}, {"id": 3509502, "nome": "Campinas"}]),
        );
        let service = service(fetcher.clone());

        let sp = service.municipalities("sp").await.unwrap();
        assert!(sp.is_live());
        assert_eq!(sp.value()[1].name, "Campinas");
        assert_eq!(sp.value()[1].state, "SP");

        // no reply registered for RJ, served from the embedded table
        let rj = service.municipalities("RJ").await.unwrap();
        assert!(rj.is_fallback());
        assert!(rj.value().iter().any(|m| m.name == "Paraty"));

        let _ = service.municipalities("SP").await.unwrap();
        assert_eq!(fetcher.calls_to("https://servicodados.ibge.gov.br/api/v1/localidades/estados/SP"), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail(
            "https://brasilapi.com.br/api/cptec",
            ApiError::Status {
                status_code: 500,
                message: "Internal Server Error".into(),
            },
        );
        let service = service(fetcher.clone());

        assert!(service.station_cities().await.unwrap().is_fallback());

        fetcher.respond_json(
            "https://brasilapi.com.br/api/cptec",
            &json!([{"id": 244, "nome": "São Paulo", "estado": "SP"}]),
        );
        let live = service.station_cities().await.unwrap();
        assert!(live.is_live());
        assert_eq!(fetcher.total_calls(), 2);
    }

    #[test]
    fn test_normalize_state() {
        assert_eq!(normalize_state(" rj ").unwrap(), "RJ");
        assert!(normalize_state("XX").is_err());
        assert_eq!(state_name("ba"), Some("Bahia"));
    }
}
