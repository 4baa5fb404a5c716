//! Centralized error types for Locamap.
//!
//! Every failure that can reach the user is caught where it happens, logged,
//! and turned into either a fallback value or the alert text returned by
//! `user_message()`. None of these errors is meant to bubble to a top-level
//! handler.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get the text shown to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Location store error: {0}")]
    Store(#[from] StoreError),

    #[error("Place search error: {0}")]
    Search(#[from] SearchError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns the message shown to the user for this error.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Store(e) => e.user_message(),
            AppError::Search(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Io(_) => "Ha fallado una operación de archivo. Inténtalo de nuevo.",
            AppError::Other(_) => "Ha ocurrido un error inesperado. Inténtalo de nuevo.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "No se pudo conectar. Comprueba tu conexión a internet."
            }
            NetworkError::Timeout => "La petición ha tardado demasiado. Inténtalo de nuevo.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "El servidor tiene problemas. Inténtalo más tarde."
            }
            NetworkError::ServerError { .. } => "La petición ha fallado. Inténtalo de nuevo.",
            NetworkError::InvalidResponse(_) => "Respuesta inesperada del servidor.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "No se encontró la configuración. Se usan valores por defecto.",
            ConfigError::Invalid(_) => "Configuración no válida. Revisa los ajustes.",
            ConfigError::ParseError(_) => "El archivo de configuración está mal formado.",
            ConfigError::MissingSetting(_) => "Falta un ajuste obligatorio. Revisa los ajustes.",
        }
    }
}

/// Errors from the hosted `locations` table and the local location list.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read locations: {0}")]
    RemoteRead(String),

    #[error("Failed to delete location {id}: {message}")]
    RemoteWrite { id: i64, message: String },

    #[error("Location index {index} out of range (len {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("No active location")]
    NoSelection,
}

impl StoreError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StoreError::RemoteRead(_) => "Error al obtener ubicaciones.",
            StoreError::RemoteWrite { .. } => "Error al eliminar la ubicación. Inténtalo de nuevo.",
            StoreError::InvalidIndex { .. } => "La ubicación seleccionada no existe.",
            StoreError::NoSelection => "No hay ninguna ubicación seleccionada.",
        }
    }
}

/// Place search failures that are shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Map is not ready")]
    MapNotReady,

    #[error("Places service is not initialized")]
    Unavailable,

    #[error("No results for query: {0}")]
    NoResults(String),
}

impl SearchError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SearchError::MapNotReady => {
                "El mapa no está listo. Por favor, intenta de nuevo en unos segundos."
            }
            SearchError::Unavailable => {
                "No se pudo inicializar el servicio de búsqueda. Por favor, recarga la página."
            }
            SearchError::NoResults(_) => "No se encontraron resultados para tu búsqueda.",
        }
    }
}

/// Weather forecast fetch failures. The widget never shows these; it falls
/// back to its default snapshot instead.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("HTTP error at {stage} stage: status {status}")]
    Status { stage: &'static str, status: u16 },

    #[error("Forecast envelope did not include a data URL")]
    MissingDataUrl,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Forecast payload has no entry for today")]
    EmptyForecast,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        "Error al obtener datos"
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_conversion() {
        let app_err: AppError = StoreError::NoSelection.into();
        assert!(matches!(app_err, AppError::Store(StoreError::NoSelection)));
    }

    #[test]
    fn test_search_alert_texts() {
        assert_eq!(
            AppError::Search(SearchError::MapNotReady).user_message(),
            "El mapa no está listo. Por favor, intenta de nuevo en unos segundos."
        );
        assert_eq!(
            SearchError::NoResults("valencia".into()).user_message(),
            "No se encontraron resultados para tu búsqueda."
        );
    }

    #[test]
    fn test_delete_failure_alert() {
        let err = StoreError::RemoteWrite {
            id: 7,
            message: "permission denied".into(),
        };
        assert_eq!(
            err.user_message(),
            "Error al eliminar la ubicación. Inténtalo de nuevo."
        );
        assert!(err.to_string().contains("location 7"));
    }

    #[test]
    fn test_network_error_splits_on_server_status() {
        let server = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let client = NetworkError::ServerError {
            status: 404,
            message: "missing".into(),
        };
        assert_ne!(server.user_message(), client.user_message());
    }

    #[test]
    fn test_weather_error_from_network() {
        let err: WeatherError = NetworkError::Timeout.into();
        assert!(matches!(err, WeatherError::Network(NetworkError::Timeout)));
    }
}
