extern crate self as space_weight_hub;

mod arbiter;
pub mod assets;
mod config;
pub mod http;
pub mod logging;
mod state;
pub mod weight;

pub use arbiter::{ArbitrationError, FRESHNESS_WINDOW, Resolution, WeightArbiter, WeightSample};
pub use config::{HubConfig, RunArgs};
pub use state::AppState;
