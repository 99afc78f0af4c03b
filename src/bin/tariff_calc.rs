use clap::Parser;
use trade_balance::core::tariff::{self, ScenarioPreset};
use trade_balance::utils::logger;
use trade_balance::TradeError;

#[derive(Parser, Debug)]
#[command(name = "tariff-calc")]
#[command(about = "Value left after a tariff: value * (1 - tariff / 100)")]
struct Args {
    /// Base value, e.g. 200 or 12,5
    #[arg(allow_negative_numbers = true)]
    value: String,

    /// Tariff percent between 0 and 100, e.g. 10 or 2,5%
    #[arg(required_unless_present = "preset", allow_negative_numbers = true)]
    tariff: Option<String>,

    /// Use a scenario preset instead of an explicit tariff
    #[arg(long, conflicts_with = "tariff")]
    preset: Option<ScenarioPreset>,

    #[arg(long, help = "Print the result as JSON")]
    json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    verbose: bool,
}

fn compute(args: &Args) -> Result<(f64, f64, f64, f64), TradeError> {
    let value = tariff::parse_number("value", &args.value)?;
    let percent = match (&args.tariff, args.preset) {
        (Some(input), _) => tariff::parse_tariff_percent(input)?,
        (None, Some(preset)) => preset.percent(),
        (None, None) => {
            return Err(TradeError::MissingConfigError {
                field: "tariff".to_string(),
            })
        }
    };
    let impact = tariff::tariff_impact(value, percent)?;
    let adjusted = tariff::adjusted_value(value, percent)?;
    Ok((value, percent, impact, adjusted))
}

fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    match compute(&args) {
        Ok((value, percent, impact, adjusted)) => {
            tracing::debug!(percent, impact, adjusted, "Tariff applied");
            if args.json {
                let output = serde_json::json!({
                    "value": value,
                    "tariff_percent": percent,
                    "impact": impact,
                    "adjusted_value": adjusted,
                });
                println!("{}", output);
            } else {
                println!("Tariff:         {}%", percent);
                println!("Impact:         {}", impact);
                println!("Adjusted value: {}", adjusted);
            }
        }
        Err(e) => {
            eprintln!("{}", e.user_friendly_message());
            eprintln!("Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    }
}
