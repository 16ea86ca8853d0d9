// Presentation text for a destination card.

use crate::{
    localities::{state_name, STATES},
    weather::{weather_icon, WeatherReport},
};

fn region_of(state: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|s| s.1.eq_ignore_ascii_case(state))
        .map(|s| s.3)
}

pub fn describe(name: &str, state: &str, capital: bool, weather: Option<&WeatherReport>) -> String {
    let state_label = state_name(state).unwrap_or(state);
    let mut text = if capital {
        format!("{name} é a capital de {state_label}")
    } else {
        format!("{name} é um destino em {state_label}")
    };

    if let Some(region) = region_of(state) {
        text.push_str(&format!(", região {region}"));
    }
    text.push('.');

    if let Some(report) = weather {
        text.push_str(&format!(
            " Agora: {:.0}°C, {} {}",
            report.temp,
            report.condition,
            weather_icon(&report.icon)
        ));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::fallback_report;

    #[test]
    fn test_capital_description() {
        assert_eq!(
            describe("Salvador", "BA", true, None),
            "Salvador é a capital de Bahia, região Nordeste."
        );
    }

    #[test]
    fn test_destination_with_weather() {
        let weather = fallback_report("Rio de Janeiro");
        let text = describe("Paraty", "RJ", false, Some(&weather));
        assert_eq!(
            text,
            "Paraty é um destino em Rio de Janeiro, região Sudeste. Agora: 28°C, Partly cloudy ⛅"
        );
    }

    #[test]
    fn test_unknown_state_uses_code() {
        assert_eq!(describe("Lugar", "XX", false, None), "Lugar é um destino em XX.");
    }
}
