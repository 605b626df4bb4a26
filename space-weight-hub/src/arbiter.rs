//! Decides which weight is authoritative for a request.
//!
//! A weight pushed by the companion app wins while it is fresh, otherwise the
//! caller's explicit weight is used, otherwise there is nothing to report.

use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

use space_weight_proto::{
    PushRequest, ValidationError, WeightResponse, WeightSource, parse_weight, validate_weight,
};

pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightSample {
    pub weight_kg: f64,
    pub at: Instant,
    pub source: WeightSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub weight_kg: f64,
    pub source: WeightSource,
    pub name: Option<String>,
}

impl Resolution {
    pub fn into_response(self) -> WeightResponse {
        WeightResponse::new(self.source, self.weight_kg, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArbitrationError {
    #[error("No weight available (phone has not sent a recent one and no ?weight= provided).")]
    InsufficientData,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Default)]
struct Latest {
    sample: Option<WeightSample>,
    /// last non-empty name, kept across pushes without one
    name: Option<String>,
}

#[derive(Debug)]
pub struct WeightArbiter {
    latest: RwLock<Latest>,
    freshness: Duration,
}

impl Default for WeightArbiter {
    fn default() -> Self {
        Self::new(FRESHNESS_WINDOW)
    }
}

impl WeightArbiter {
    pub fn new(freshness: Duration) -> Self {
        Self { latest: RwLock::new(Latest::default()), freshness }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Store a weight pushed by the phone, returning the accepted kg value.
    pub async fn record_push(&self, push: &PushRequest) -> Result<f64, ValidationError> {
        let weight_kg = validate_weight("weight_kg", push.weight_kg.as_ref())?;
        let name = push.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

        let mut latest = self.latest.write().await;
        latest.sample = Some(WeightSample {
            weight_kg,
            at: Instant::now(),
            source: WeightSource::Phone,
        });
        if let Some(name) = name {
            latest.name = Some(name.to_string());
        }

        Ok(weight_kg)
    }

    /// Pick the weight for a request.
    ///
    /// `explicit` is only parsed when no fresh phone sample exists, so a
    /// malformed value is ignored while the phone is active.
    pub async fn resolve(&self, explicit: Option<&str>) -> Result<Resolution, ArbitrationError> {
        let (sample, name, now) = {
            let latest = self.latest.read().await;
            (latest.sample, latest.name.clone(), Instant::now())
        };

        if let Some(sample) = sample {
            let age = now.saturating_duration_since(sample.at);
            if age <= self.freshness {
                log::info!("using cached phone weight: {} kg ({age:?} old)", sample.weight_kg);
                return Ok(Resolution { weight_kg: sample.weight_kg, source: WeightSource::Phone, name });
            }
            log::debug!("phone weight is stale ({age:?} old)");
        }

        match explicit {
            Some(raw) => {
                let weight_kg = parse_weight("weight", raw)?;
                log::info!("using query weight: {weight_kg} kg");
                Ok(Resolution { weight_kg, source: WeightSource::Query, name: None })
            }
            None => Err(ArbitrationError::InsufficientData),
        }
    }
}
