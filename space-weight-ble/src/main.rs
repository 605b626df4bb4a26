//! BLE diagnostic tool for the Space Weight scale
//!
//! Lists nearby devices, shows which one would be picked as the scale, and
//! reads the weight the same way the hub does.

use clap::{Parser, Subcommand};
use std::time::Duration;

use space_weight_scale::{
    BtleTransport, ResolverConfig, ScaleArgs, ScaleReader, ScaleResolver, ScaleTransport,
};

#[derive(Parser)]
#[command(name = "space-weight-ble")]
#[command(about = "BLE diagnostic tool for the Space Weight scale")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every advertising device (stand on / wake up the scale first)
    Scan {
        /// Scan duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
        /// Name substrings to mark as likely scales (comma separated)
        #[arg(long, value_delimiter = ',')]
        name_hints: Option<Vec<String>>,
    },
    /// Print the address the hub would connect to
    Resolve(ScaleArgs),
    /// Read the weight, retrying like the hub does
    Read(ScaleArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let _logger = flexi_logger::Logger::try_with_env_or_str("warn")?.start()?;

    let transport = BtleTransport::new().await?;

    match cli.command {
        Commands::Scan { duration, name_hints } => {
            let mut config = ResolverConfig::default();
            if let Some(hints) = name_hints {
                config.name_hints = hints;
            }
            scan_devices(&transport, &ScaleResolver::new(config), duration).await?;
        }
        Commands::Resolve(args) => {
            let resolver = ScaleResolver::new(args.reader_config().resolver);
            println!("Scanning for the scale ({:?})...", resolver.config().scan_timeout);
            match resolver.resolve_address(&transport).await {
                Some(address) => println!("Scale address: {address}"),
                None => {
                    eprintln!("No scale found and no fallback address configured");
                    std::process::exit(1);
                }
            }
        }
        Commands::Read(args) => {
            let reader = ScaleReader::new(transport, args.reader_config());
            let kg = reader.get_weight().await?;
            println!("{kg:.1} kg");
        }
    }

    Ok(())
}

async fn scan_devices(
    transport: &BtleTransport,
    resolver: &ScaleResolver,
    duration: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Scanning for BLE devices ({duration} seconds)... stand on / wake up the scale!");

    let devices = transport.discover(Duration::from_secs(duration)).await?;

    println!("\nFound {} devices:", devices.len());
    for device in &devices {
        let name = device.name.as_deref().unwrap_or("Unknown");
        let rssi = device
            .rssi
            .map(|r| format!("{r} dBm"))
            .unwrap_or_else(|| "N/A".to_string());
        let marker = if resolver.is_candidate(device) { " [SCALE?]" } else { "" };

        println!("  {}  |  {}  |  RSSI={}{}", device.address, name, rssi, marker);
    }

    if let Some(d) = resolver.select(&devices) {
        println!("\nWould use: {} ({})", d.address, d.name.as_deref().unwrap_or("Unknown"));
    }

    Ok(())
}
