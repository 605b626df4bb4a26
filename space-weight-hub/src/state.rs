use std::path::PathBuf;

use space_weight_scale::ScaleReader;

use crate::WeightArbiter;

/// Everything request handlers share, built once in `main`
pub struct AppState<T> {
    pub arbiter: WeightArbiter,
    /// `None` when running without a Bluetooth adapter
    pub scale: Option<ScaleReader<T>>,
    pub static_dir: PathBuf,
}

impl<T> AppState<T> {
    pub fn new(arbiter: WeightArbiter, scale: Option<ScaleReader<T>>, static_dir: PathBuf) -> Self {
        Self { arbiter, scale, static_dir }
    }
}
