//! Command line flags shared by the binaries that talk to the scale

use std::time::Duration;

use space_weight_proto::ble::DEFAULT_NAME_HINTS;

use crate::{ReaderConfig, ResolverConfig, RetryPolicy};

#[derive(clap::Args, Debug, Clone)]
pub struct ScaleArgs {
    /// Address to use when no device matches the name hints
    #[arg(long, env = "SPACE_WEIGHT_SCALE_ADDRESS")]
    pub scale_address: Option<String>,

    /// Advertised name substrings identifying the scale (comma separated)
    #[arg(
        long,
        env = "SPACE_WEIGHT_NAME_HINTS",
        value_delimiter = ',',
        default_values_t = DEFAULT_NAME_HINTS.iter().map(|h| h.to_string()).collect::<Vec<_>>()
    )]
    pub name_hints: Vec<String>,

    /// Discovery scan duration in seconds
    #[arg(long, env = "SPACE_WEIGHT_SCAN_TIMEOUT", default_value_t = 10)]
    pub scan_timeout: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "SPACE_WEIGHT_CONNECT_TIMEOUT", default_value_t = 15)]
    pub connect_timeout: u64,

    /// Resolve + connect + read cycles before giving up
    #[arg(long, env = "SPACE_WEIGHT_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Seconds to wait between attempts
    #[arg(long, env = "SPACE_WEIGHT_RETRY_DELAY", default_value_t = 2)]
    pub retry_delay: u64,

    /// Random extra wait between attempts, in milliseconds
    #[arg(long, env = "SPACE_WEIGHT_RETRY_JITTER_MS", default_value_t = 0)]
    pub retry_jitter_ms: u64,
}

impl ScaleArgs {
    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            resolver: ResolverConfig {
                scan_timeout: Duration::from_secs(self.scan_timeout),
                name_hints: self.name_hints.clone(),
                fallback_address: self.scale_address.clone().filter(|a| !a.trim().is_empty()),
            },
            connect_timeout: Duration::from_secs(self.connect_timeout),
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                delay: Duration::from_secs(self.retry_delay),
                jitter: Duration::from_millis(self.retry_jitter_ms),
            },
            ..Default::default()
        }
    }
}
