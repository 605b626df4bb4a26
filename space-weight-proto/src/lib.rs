//! Space Weight protocol - BLE constants, wire types and weight validation

pub mod ble;
pub mod planets;

pub use planets::{PlanetWeights, weights_on_planets};

/// Where an authoritative weight came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightSource {
    /// Read directly from the BLE scale
    Scale,
    /// Pushed by the companion app
    Phone,
    /// Supplied by the caller with the request
    Query,
}

/// Body of `POST /set_weight_from_phone`
///
/// `weight_kg` is kept as raw JSON so that missing, non-numeric and
/// non-positive values can each be reported precisely.
#[derive(serde::Deserialize, Debug, Clone, Default)]
pub struct PushRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<serde_json::Value>,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok".to_string() }
    }
}

/// Arbitration result combined with the planetary table
#[derive(serde::Serialize, Debug, Clone, PartialEq)]
pub struct WeightResponse {
    pub source: WeightSource,
    pub earth_kg: f64,
    pub name: Option<String>,
    pub planets: PlanetWeights,
}

impl WeightResponse {
    pub fn new(source: WeightSource, earth_kg: f64, name: Option<String>) -> Self {
        Self {
            source,
            earth_kg,
            name,
            planets: weights_on_planets(earth_kg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must be a number")]
    NotANumber(&'static str),
    #[error("{0} must be > 0")]
    NotPositive(&'static str),
}

/// Validate a weight given as JSON; numbers and numeric strings are accepted.
pub fn validate_weight(
    field: &'static str,
    value: Option<&serde_json::Value>,
) -> Result<f64, ValidationError> {
    let weight = match value {
        None | Some(serde_json::Value::Null) => return Err(ValidationError::Missing(field)),
        Some(serde_json::Value::Number(n)) => n.as_f64().ok_or(ValidationError::NotANumber(field))?,
        Some(serde_json::Value::String(s)) => return parse_weight(field, s),
        Some(_) => return Err(ValidationError::NotANumber(field)),
    };
    check_positive(field, weight)
}

/// Validate a weight given as text, e.g. a query parameter.
pub fn parse_weight(field: &'static str, s: &str) -> Result<f64, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    let weight = s
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber(field))?;
    check_positive(field, weight)
}

fn check_positive(field: &'static str, weight: f64) -> Result<f64, ValidationError> {
    if !weight.is_finite() {
        return Err(ValidationError::NotANumber(field));
    }
    if weight <= 0.0 {
        return Err(ValidationError::NotPositive(field));
    }
    Ok(weight)
}
