use std::sync::Arc;

use space_weight_scale::{BtleTransport, ScaleArgs, ScaleReader};

#[derive(clap::Parser)]
#[command(name = "space-weight-hub")]
#[command(about = "Space Weight hub server")]
struct Cli {
    /// Write logs to this directory instead of stderr
    #[arg(long, global = true, env = "SPACE_WEIGHT_LOG_DIR")]
    log_dir: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run the server
    Run(space_weight_hub::RunArgs),
    /// Read the scale once with the given settings and exit
    CheckScale(ScaleArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli: Cli = clap::Parser::parse();
    let _logger = space_weight_hub::logging::init(cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Run(args) => run(args.into()).await?,
        Commands::CheckScale(args) => {
            let reader = ScaleReader::new(BtleTransport::new().await?, args.reader_config());
            let kg = reader.get_weight().await?;
            println!("{kg:.1} kg");
        }
    }

    Ok(())
}

async fn run(config: space_weight_hub::HubConfig) -> std::io::Result<()> {
    let scale = match config.scale {
        Some(reader_config) => match BtleTransport::new().await {
            Ok(transport) => Some(ScaleReader::new(transport, reader_config)),
            Err(e) => {
                log::warn!("scale reader disabled: {e}");
                None
            }
        },
        None => {
            log::info!("scale reader disabled by configuration");
            None
        }
    };

    let state = Arc::new(space_weight_hub::AppState::new(
        space_weight_hub::WeightArbiter::new(config.freshness),
        scale,
        config.static_dir,
    ));

    space_weight_hub::http::run_server(&config.listen, state).await
}
