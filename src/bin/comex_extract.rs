use clap::Parser;
use std::path::PathBuf;
use trade_balance::core::comex::{self, ExtractOptions, UNITED_STATES_CODE};
use trade_balance::domain::model::Direction;
use trade_balance::utils::logger;

#[derive(Parser, Debug)]
#[command(name = "comex-extract")]
#[command(about = "Filter a raw Comex Stat file down to one partner country")]
struct Args {
    /// Raw Comex Stat file (EXP_COMPLETA.csv / IMP_COMPLETA.csv)
    input: PathBuf,

    /// Output file; defaults to the name the report reads for the direction
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// export or import
    #[arg(short, long, default_value = "export")]
    direction: Direction,

    #[arg(long, default_value = UNITED_STATES_CODE, help = "Partner country code (CO_PAIS)")]
    country: String,

    /// Country table with CO_PAIS and NO_PAIS, adds the Pais column
    #[arg(long)]
    countries: Option<PathBuf>,

    /// Country name fragment looked up in --countries, e.g. "ESTADOS UNIDOS"
    #[arg(long, requires = "countries")]
    country_name: Option<String>,

    /// NCM table with CO_NCM and NO_NCM_POR, fills the Produto column
    #[arg(long)]
    ncm: Option<PathBuf>,

    #[arg(long, default_value_t = ';', help = "Delimiter of the input and lookup files")]
    delimiter: char,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let output = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(match args.direction {
            Direction::Export => trade_balance::config::toml_config::DEFAULT_EXPORT_FILE,
            Direction::Import => trade_balance::config::toml_config::DEFAULT_IMPORT_FILE,
        })
    });
    let options = ExtractOptions {
        country_code: args.country.clone(),
        country_table: args.countries.clone(),
        country_name: args.country_name.clone(),
        ncm_table: args.ncm.clone(),
        delimiter: args.delimiter,
        ..ExtractOptions::new(args.input.clone(), output, args.direction)
    };

    let result = tokio::task::spawn_blocking(move || comex::run_extract(&options)).await?;
    match result {
        Ok(summary) => {
            println!(
                "{} of {} rows kept ({:.1} million USD)",
                summary.rows_written,
                summary.rows_read,
                summary.total_value / 1_000_000.0
            );
        }
        Err(e) => {
            tracing::error!(
                "Extraction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
