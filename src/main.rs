mod catalog;
mod error;
mod matcher;
mod parser;
mod pdf;
mod pipeline;
mod settings;
mod store;

use std::time::Instant;

use clap::{Parser, Subcommand};

use matcher::MatchQuery;
use pdf::LopdfSource;
use settings::Settings;

#[derive(Parser)]
#[command(name = "manual_finder", about = "Extract SKUs from fireplace manuals and match products to them")]
struct Cli {
    /// Log at debug level (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the manuals directory and write the SKU manifest
    Manifest {
        /// Only scan these brand directories (repeatable)
        #[arg(short, long = "brand")]
        brands: Vec<String>,
        /// Process files one by one on the main thread
        #[arg(short, long)]
        sequential: bool,
    },
    /// Match the product list against the manifest and copy manuals
    Find {
        /// Process products one by one on the main thread
        #[arg(short, long)]
        sequential: bool,
    },
    /// Show ranked manual candidates for one product as JSON
    Lookup {
        sku: String,
        #[arg(short, long)]
        brand: String,
        #[arg(long)]
        series: Option<String>,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let t0 = Instant::now();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Manifest { brands, sequential } => {
            let stats = pipeline::build_manifest(&settings, &brands, sequential, &LopdfSource)?;
            stats.print();
            Ok(())
        }
        Commands::Find { sequential } => {
            let stats = pipeline::find_manuals(&settings, sequential)?;
            stats.print();
            Ok(())
        }
        Commands::Lookup { sku, brand, series } => {
            let query = MatchQuery {
                manufacturer_sku: sku,
                brand,
                series: series.unwrap_or_default(),
                ..MatchQuery::default()
            };
            let value = pipeline::lookup(&settings, &query)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
