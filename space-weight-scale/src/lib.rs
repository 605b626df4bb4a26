//! Space Weight Scale
//!
//! BLE client that finds the bathroom scale and reads its weight.
//!
//! # Example
//!
//! ```ignore
//! use space_weight_scale::{BtleTransport, ReaderConfig, ScaleReader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = BtleTransport::new().await?;
//!     let reader = ScaleReader::new(transport, ReaderConfig::default());
//!
//!     // Fails with `ScaleError::RetriesExhausted` when the scale never answers
//!     let kg = reader.get_weight().await?;
//!     println!("{kg:.1} kg");
//!
//!     Ok(())
//! }
//! ```

mod btle;
#[cfg(feature = "cli")]
mod cli;
mod reader;
mod resolver;
mod transport;

#[cfg(feature = "cli")]
pub use cli::ScaleArgs;
pub use btle::{BtleSession, BtleTransport, get_adapter};
pub use reader::{ReaderConfig, RetryPolicy, ScaleReader, WEIGHT_CHAR};
pub use resolver::{ResolverConfig, ScaleResolver};
pub use transport::{DiscoveredDevice, ScaleSession, ScaleTransport};

#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    #[error("no Bluetooth adapter found")]
    NoAdapter,
    #[error("bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),
    #[error("scale discovery failed: {0}")]
    Discovery(String),
    #[error("no scale address could be resolved")]
    Resolution,
    #[error("unable to connect to the scale at {address}: {reason}")]
    Connection { address: String, reason: String },
    #[error("error reading from the scale at {address}: {reason}")]
    Read { address: String, reason: String },
    #[error("failed to read weight from scale after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ScaleError> },
}

impl ScaleError {
    pub fn connection(address: &str, reason: impl ToString) -> Self {
        Self::Connection { address: address.to_string(), reason: reason.to_string() }
    }

    pub fn read(address: &str, reason: impl ToString) -> Self {
        Self::Read { address: address.to_string(), reason: reason.to_string() }
    }
}
