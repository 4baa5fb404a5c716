use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FALLBACK_TEMP: &str = "20";
pub const FALLBACK_CONDITION: &str = "Poco nublado";
pub const FALLBACK_HUMIDITY: &str = "66";
pub const FALLBACK_WIND: &str = "16";

const NOT_AVAILABLE: &str = "N/A";
const LOADING: &str = "Cargando...";

/// What the widget displays. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Maximum temperature, °C
    pub temp: String,
    pub condition: String,
    /// Maximum relative humidity, %
    pub humidity: String,
    /// Wind speed, km/h
    pub wind: String,
}

impl WeatherSnapshot {
    /// Fixed values shown whenever a fetch fails
    pub fn fallback() -> Self {
        Self {
            temp: FALLBACK_TEMP.to_string(),
            condition: FALLBACK_CONDITION.to_string(),
            humidity: FALLBACK_HUMIDITY.to_string(),
            wind: FALLBACK_WIND.to_string(),
        }
    }

    /// Placeholder shown until the first fetch completes
    pub fn loading() -> Self {
        Self {
            temp: NOT_AVAILABLE.to_string(),
            condition: LOADING.to_string(),
            humidity: NOT_AVAILABLE.to_string(),
            wind: NOT_AVAILABLE.to_string(),
        }
    }

    /// Build a snapshot from one forecast day, filling gaps field by field.
    pub fn from_day(day: &DayForecast) -> Self {
        Self {
            temp: day.max_temperature().unwrap_or_else(|| FALLBACK_TEMP.to_string()),
            condition: day.sky().unwrap_or_else(|| FALLBACK_CONDITION.to_string()),
            humidity: day.max_humidity().unwrap_or_else(|| FALLBACK_HUMIDITY.to_string()),
            wind: day.wind_speed().unwrap_or_else(|| FALLBACK_WIND.to_string()),
        }
    }
}

impl Default for WeatherSnapshot {
    fn default() -> Self {
        Self::loading()
    }
}

/// First-stage response: points at the real payload through `datos`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastEnvelope {
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub estado: Option<u16>,
    #[serde(default)]
    pub datos: Option<String>,
}

/// One element of the second-stage payload array
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MunicipalityForecast {
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub prediccion: Option<Prediction>,
}

impl MunicipalityForecast {
    /// First forecast day, which the service lists as today
    pub fn today(&self) -> Option<&DayForecast> {
        self.prediccion.as_ref().and_then(|p| p.dia.first())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub dia: Vec<DayForecast>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DayForecast {
    #[serde(default)]
    pub fecha: Option<String>,
    #[serde(default)]
    pub temperatura: Option<Extremes>,
    #[serde(default, rename = "humedadRelativa")]
    pub humedad_relativa: Option<Extremes>,
    #[serde(default)]
    pub viento: Vec<WindPeriod>,
    #[serde(default, rename = "estadoCielo")]
    pub estado_cielo: Vec<SkyPeriod>,
}

impl DayForecast {
    pub fn max_temperature(&self) -> Option<String> {
        self.temperatura.as_ref().and_then(|t| reading(t.maxima.as_ref()))
    }

    pub fn max_humidity(&self) -> Option<String> {
        self.humedad_relativa
            .as_ref()
            .and_then(|h| reading(h.maxima.as_ref()))
    }

    /// Speed of the first wind period
    pub fn wind_speed(&self) -> Option<String> {
        self.viento.first().and_then(|w| reading(w.velocidad.as_ref()))
    }

    /// Description of the first sky period
    pub fn sky(&self) -> Option<String> {
        self.estado_cielo
            .first()
            .and_then(|s| reading(s.descripcion.as_ref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Extremes {
    #[serde(default)]
    pub maxima: Option<Value>,
    #[serde(default)]
    pub minima: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindPeriod {
    #[serde(default)]
    pub velocidad: Option<Value>,
    #[serde(default)]
    pub direccion: Option<Value>,
    #[serde(default)]
    pub periodo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkyPeriod {
    #[serde(default)]
    pub descripcion: Option<Value>,
    #[serde(default)]
    pub periodo: Option<String>,
}

/// Display text for a payload leaf. Null and empty strings count as missing;
/// numbers (zero included) are kept.
fn reading(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
