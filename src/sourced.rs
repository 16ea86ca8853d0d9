// Result of a lookup that may have been served from embedded fallback data.

use tracing::warn;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Live(T),
    Fallback(T),
}

impl<T> Sourced<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback(_))
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Sourced::Live(_))
    }

    pub fn as_ref(&self) -> Sourced<&T> {
        match self {
            Sourced::Live(v) => Sourced::Live(v),
            Sourced::Fallback(v) => Sourced::Fallback(v),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Sourced::Live(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Live(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Sourced::Live(v) => Sourced::Live(f(v)),
            Sourced::Fallback(v) => Sourced::Fallback(f(v)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sourced::Live(_) => "live",
            Sourced::Fallback(_) => "fallback",
        }
    }
}

/// Turn a failed lookup into fallback data when the failure is one a fallback
/// may cover. Input errors still surface.
pub fn or_fallback<T>(
    what: &str,
    result: Result<T, ApiError>,
    fallback: impl FnOnce() -> T,
) -> Result<Sourced<T>, ApiError> {
    match result {
        Ok(value) => Ok(Sourced::Live(value)),
        Err(err) if err.is_recoverable() => {
            warn!(lookup = what, error = %err, "serving fallback data");
            Ok(Sourced::Fallback(fallback()))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_fallback_substitutes_network_errors() {
        let sourced = or_fallback("widget", Err(ApiError::Network("down".into())), || 7).unwrap();
        assert_eq!(sourced, Sourced::Fallback(7));
        assert_eq!(sourced.label(), "fallback");
    }

    #[test]
    fn test_or_fallback_keeps_input_errors() {
        let result = or_fallback::<u8>("widget", Err(ApiError::InvalidInput("bad".into())), || 0);
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_map_preserves_origin() {
        assert_eq!(Sourced::Live(2).map(|v| v * 2), Sourced::Live(4));
        assert_eq!(Sourced::Fallback(2).map(|v| v + 1).into_inner(), 3);
    }
}
