// Coordinates for state capitals and the usual tourist destinations.

use serde::Serialize;

use crate::fuzzy::fold;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Place {
    pub name: &'static str,
    pub state: &'static str,
    pub point: GeoPoint,
    pub capital: bool,
}

const fn place(name: &'static str, state: &'static str, lat: f64, lon: f64, capital: bool) -> Place {
    Place {
        name,
        state,
        point: GeoPoint { lat, lon },
        capital,
    }
}

pub const PLACES: &[Place] = &[
    place("Rio Branco", "AC", -9.97499, -67.8243, true),
    place("Maceió", "AL", -9.66599, -35.7350, true),
    place("Maragogi", "AL", -9.01220, -35.2225, false),
    place("Macapá", "AP", 0.03493, -51.0694, true),
    place("Manaus", "AM", -3.11866, -60.0212, true),
    place("Salvador", "BA", -12.9718, -38.5011, true),
    place("Porto Seguro", "BA", -16.4435, -39.0643, false),
    place("Lençóis", "BA", -12.5616, -41.3889, false),
    place("Fortaleza", "CE", -3.71664, -38.5423, true),
    place("Jijoca de Jericoacoara", "CE", -2.79330, -40.5127, false),
    place("Brasília", "DF", -15.7795, -47.9297, true),
    place("Vitória", "ES", -20.3155, -40.3128, true),
    place("Goiânia", "GO", -16.6864, -49.2643, true),
    place("São Luís", "MA", -2.53874, -44.2825, true),
    place("Cuiabá", "MT", -15.6010, -56.0974, true),
    place("Campo Grande", "MS", -20.4486, -54.6295, true),
    place("Bonito", "MS", -21.1261, -56.4836, false),
    place("Belo Horizonte", "MG", -19.9102, -43.9266, true),
    place("Ouro Preto", "MG", -20.3856, -43.5035, false),
    place("Belém", "PA", -1.45502, -48.5024, true),
    place("João Pessoa", "PB", -7.11509, -34.8641, true),
    place("Curitiba", "PR", -25.4195, -49.2646, true),
    place("Foz do Iguaçu", "PR", -25.5163, -54.5854, false),
    place("Recife", "PE", -8.04666, -34.8771, true),
    place("Ipojuca", "PE", -8.39830, -35.0639, false),
    place("Fernando de Noronha", "PE", -3.85760, -32.4297, false),
    place("Teresina", "PI", -5.09194, -42.8034, true),
    place("Rio de Janeiro", "RJ", -22.9129, -43.2003, true),
    place("Paraty", "RJ", -23.2178, -44.7131, false),
    place("Armação dos Búzios", "RJ", -22.7469, -41.8817, false),
    place("Angra dos Reis", "RJ", -23.0067, -44.3181, false),
    place("Petrópolis", "RJ", -22.5112, -43.1779, false),
    place("Natal", "RN", -5.79357, -35.1986, true),
    place("Porto Alegre", "RS", -30.0318, -51.2065, true),
    place("Gramado", "RS", -29.3733, -50.8762, false),
    place("Porto Velho", "RO", -8.76077, -63.8999, true),
    place("Boa Vista", "RR", 2.81972, -60.6733, true),
    place("Florianópolis", "SC", -27.5945, -48.5477, true),
    place("Balneário Camboriú", "SC", -26.9926, -48.6352, false),
    place("São Paulo", "SP", -23.5489, -46.6388, true),
    place("Campinas", "SP", -22.9056, -47.0608, false),
    place("Santos", "SP", -23.9608, -46.3336, false),
    place("Campos do Jordão", "SP", -22.7296, -45.5833, false),
    place("Ubatuba", "SP", -23.4336, -45.0838, false),
    place("Aracaju", "SE", -10.9095, -37.0748, true),
    place("Palmas", "TO", -10.1689, -48.3317, true),
];

/// Exact lookup ignoring case and accents, optionally narrowed to one state.
pub fn lookup(name: &str, state: Option<&str>) -> Option<&'static Place> {
    let wanted = fold(name);
    PLACES.iter().find(|p| {
        fold(p.name) == wanted && state.map_or(true, |uf| p.state.eq_ignore_ascii_case(uf))
    })
}

pub fn places_in(state: &str) -> impl Iterator<Item = &'static Place> + '_ {
    PLACES
        .iter()
        .filter(move |p| p.state.eq_ignore_ascii_case(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_accents_and_case() {
        let place = lookup("sao paulo", None).unwrap();
        assert_eq!(place.state, "SP");
        assert!(lookup("FLORIANOPOLIS", Some("sc")).is_some());
        assert!(lookup("Florianópolis", Some("RJ")).is_none());
    }

    #[test]
    fn test_every_state_has_one_capital() {
        for uf in crate::localities::STATES.iter().map(|s| s.1) {
            let capitals = places_in(uf).filter(|p| p.capital).count();
            assert_eq!(capitals, 1, "state {uf}");
        }
    }
}
