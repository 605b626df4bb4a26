//! Reads the weight characteristic, retrying the whole
//! resolve + connect + read cycle on failure.

use rand::Rng;
use std::time::Duration;
use uuid::Uuid;

use space_weight_proto::ble::decode_weight;

use crate::{ResolverConfig, ScaleError, ScaleResolver, ScaleSession, ScaleTransport};

/// Weight Characteristic UUID: 0000f0a0-0000-1000-8000-00805f9b34fb
pub const WEIGHT_CHAR: Uuid = Uuid::from_u128(0x0000f0a0_0000_1000_8000_00805f9b34fb);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// Upper bound of a random extra wait added to `delay`
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// How long to wait before the next attempt
    pub fn backoff(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        let max = self.jitter.as_millis() as u64;
        self.delay + Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub resolver: ResolverConfig,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
    pub characteristic: Uuid,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            connect_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            characteristic: WEIGHT_CHAR,
        }
    }
}

pub struct ScaleReader<T> {
    transport: T,
    resolver: ScaleResolver,
    connect_timeout: Duration,
    retry: RetryPolicy,
    characteristic: Uuid,
}

impl<T: ScaleTransport> ScaleReader<T> {
    pub fn new(transport: T, config: ReaderConfig) -> Self {
        Self {
            transport,
            resolver: ScaleResolver::new(config.resolver),
            connect_timeout: config.connect_timeout,
            retry: config.retry,
            characteristic: config.characteristic,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn resolver(&self) -> &ScaleResolver {
        &self.resolver
    }

    /// Weight in kg, or `None` once every attempt has failed.
    pub async fn read_weight_once(&self) -> Option<f64> {
        self.get_weight().await.ok()
    }

    /// Weight in kg, `ScaleError::RetriesExhausted` once every attempt has failed.
    pub async fn get_weight(&self) -> Result<f64, ScaleError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt().await {
                Ok(kg) => {
                    log::info!("read {kg:.1} kg from the scale (attempt {attempt}/{attempts})");
                    return Ok(kg);
                }
                Err(e) => {
                    log::error!(
                        "error reading from Bluetooth scale (attempt {attempt}/{attempts}): {e}"
                    );
                    if attempt >= attempts {
                        log::error!("max retries reached, could not read from the scale");
                        return Err(ScaleError::RetriesExhausted { attempts, last: Box::new(e) });
                    }
                    let delay = self.retry.backoff();
                    log::info!("retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One full cycle. Nothing from a failed cycle is reused by the next.
    async fn attempt(&self) -> Result<f64, ScaleError> {
        let address = self
            .resolver
            .resolve_address(&self.transport)
            .await
            .ok_or(ScaleError::Resolution)?;

        let session =
            match tokio::time::timeout(self.connect_timeout, self.transport.connect(&address)).await
            {
                Ok(session) => session?,
                Err(_) => {
                    return Err(ScaleError::connection(
                        &address,
                        format!("timed out after {:?}", self.connect_timeout),
                    ));
                }
            };

        let result = self.read_session(&session).await;
        session.disconnect().await;
        result
    }

    async fn read_session(&self, session: &T::Session) -> Result<f64, ScaleError> {
        match tokio::time::timeout(self.connect_timeout, session.discover_services()).await {
            Ok(discovered) => discovered?,
            Err(_) => {
                return Err(ScaleError::connection(
                    session.address(),
                    format!("service discovery timed out after {:?}", self.connect_timeout),
                ));
            }
        }

        if !session.is_connected().await {
            return Err(ScaleError::connection(session.address(), "not connected"));
        }

        let data = session.read(self.characteristic).await?;
        log::debug!("raw weight bytes from {}: {data:?}", session.address());
        decode_weight(&data).map_err(|e| ScaleError::read(session.address(), e))
    }
}
