use std::path::PathBuf;
use std::time::Duration;

use space_weight_scale::{ReaderConfig, ScaleArgs};

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Address to listen on
    #[arg(long, env = "SPACE_WEIGHT_LISTEN", default_value = "127.0.0.1:8000")]
    pub listen: String,

    /// Directory holding index.html and the other front-end files
    #[arg(long, env = "SPACE_WEIGHT_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Seconds a phone weight stays preferred over ?weight=
    #[arg(long, env = "SPACE_WEIGHT_FRESHNESS_SECS", default_value_t = 30)]
    pub freshness_secs: u64,

    /// Run without a Bluetooth adapter, /read_scale then answers 503
    #[arg(long, env = "SPACE_WEIGHT_NO_SCALE")]
    pub no_scale: bool,

    #[command(flatten)]
    pub scale: ScaleArgs,
}

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub listen: String,
    pub static_dir: PathBuf,
    pub freshness: Duration,
    pub scale: Option<ReaderConfig>,
}

impl From<RunArgs> for HubConfig {
    fn from(args: RunArgs) -> Self {
        Self {
            scale: (!args.no_scale).then(|| args.scale.reader_config()),
            listen: args.listen,
            static_dir: args.static_dir,
            freshness: Duration::from_secs(args.freshness_secs),
        }
    }
}
