//! Filters a raw Comex Stat extract down to one partner country and writes
//! it in the layout the report loader reads.

use crate::domain::model::{Direction, Period};
use crate::utils::error::{Result, TradeError};
use crate::utils::validation::{self, Validate};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const UNITED_STATES_CODE: &str = "249";
pub const PROGRESS_EVERY: u64 = 100_000;

const YEAR_COLUMN: &str = "CO_ANO";
const MONTH_COLUMN: &str = "CO_MES";
const COUNTRY_COLUMN: &str = "CO_PAIS";
const NCM_COLUMN: &str = "CO_NCM";
const VALUE_COLUMN: &str = "VL_FOB";
const COUNTRY_NAME_COLUMN: &str = "NO_PAIS";
const NCM_NAME_COLUMN: &str = "NO_NCM_POR";

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub direction: Direction,
    pub country_code: String,
    /// Country table (`CO_PAIS`, `NO_PAIS`); enables the `Pais` column.
    pub country_table: Option<PathBuf>,
    /// Name fragment looked up in the country table instead of `country_code`.
    pub country_name: Option<String>,
    /// NCM table (`CO_NCM`, `NO_NCM_POR`) used to fill `Produto`.
    pub ncm_table: Option<PathBuf>,
    pub delimiter: char,
}

impl ExtractOptions {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, direction: Direction) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            direction,
            country_code: UNITED_STATES_CODE.to_string(),
            country_table: None,
            country_name: None,
            ncm_table: None,
            delimiter: ';',
        }
    }
}

impl Validate for ExtractOptions {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input.to_string_lossy())?;
        validation::validate_path("output", &self.output.to_string_lossy())?;
        validation::validate_non_empty_string("country_code", &self.country_code)?;
        if let Some(name) = &self.country_name {
            validation::validate_non_empty_string("country_name", name)?;
            validation::validate_required_field("country_table", &self.country_table)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractSummary {
    pub rows_read: u64,
    pub rows_written: u64,
    /// Sum of `VL_FOB` over the written rows, in USD.
    pub total_value: f64,
}

/// Lookups resolved before streaming the main file.
#[derive(Debug, Clone, Default)]
pub struct ExtractContext {
    pub country_code: String,
    pub country_label: Option<String>,
    pub ncm_names: HashMap<String, String>,
}

/// Comex codes show up both zero-padded and bare.
fn normalize_code(code: &str) -> &str {
    let trimmed = code.trim().trim_start_matches('0');
    if trimmed.is_empty() {
        "0"
    } else {
        trimmed
    }
}

/// Reads a two-column lookup table keyed by a code column.
pub fn load_lookup<R: Read>(
    reader: R,
    source: &str,
    delimiter: char,
    key_column: &str,
    value_column: &str,
) -> Result<HashMap<String, String>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let key_idx = column(&headers, key_column, source)?;
    let value_idx = column(&headers, value_column, source)?;

    let mut lookup = HashMap::new();
    for row in reader.records() {
        let row = row?;
        if let (Some(key), Some(value)) = (row.get(key_idx), row.get(value_idx)) {
            lookup.insert(normalize_code(key).to_string(), value.to_string());
        }
    }
    tracing::info!("{}: {} entries loaded", source, lookup.len());
    Ok(lookup)
}

/// First country whose name contains `fragment`, ignoring case.
pub fn find_country_code(countries: &HashMap<String, String>, fragment: &str) -> Option<String> {
    let needle = fragment.to_lowercase();
    let mut matches: Vec<(&String, &String)> = countries
        .iter()
        .filter(|(_, name)| name.to_lowercase().contains(&needle))
        .collect();
    matches.sort();
    matches.first().map(|(code, _)| (*code).clone())
}

fn column(headers: &StringRecord, name: &str, source: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| TradeError::MissingColumnError {
            file: source.to_string(),
            column: name.to_string(),
        })
}

/// Streams `reader`, keeps the rows of `context.country_code` and writes
/// them comma-delimited with `Data`, `Pais` (when known), `Produto` and
/// `Tipo` appended.
pub fn extract_rows<R: Read, W: Write>(
    reader: R,
    writer: W,
    source: &str,
    delimiter: char,
    direction: Direction,
    context: &ExtractContext,
) -> Result<ExtractSummary> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(Trim::All)
        .from_reader(reader);
    let mut writer = WriterBuilder::new().from_writer(writer);

    let headers = reader.headers()?.clone();
    let year_idx = column(&headers, YEAR_COLUMN, source)?;
    let month_idx = column(&headers, MONTH_COLUMN, source)?;
    let country_idx = column(&headers, COUNTRY_COLUMN, source)?;
    let ncm_idx = column(&headers, NCM_COLUMN, source)?;
    let value_idx = column(&headers, VALUE_COLUMN, source)?;

    let mut out_headers = headers.clone();
    out_headers.push_field("Data");
    if context.country_label.is_some() {
        out_headers.push_field("Pais");
    }
    out_headers.push_field("Produto");
    out_headers.push_field("Tipo");
    writer.write_record(&out_headers)?;

    let wanted = normalize_code(&context.country_code);
    let mut summary = ExtractSummary::default();

    for row in reader.records() {
        let row = row?;
        summary.rows_read += 1;
        if summary.rows_read % PROGRESS_EVERY == 0 {
            tracing::info!(
                "{}: {} rows read, {} kept",
                source,
                summary.rows_read,
                summary.rows_written
            );
        }

        if normalize_code(row.get(country_idx).unwrap_or("")) != wanted {
            continue;
        }

        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let malformed = |message: String| TradeError::ParseError {
            file: source.to_string(),
            line,
            message,
        };
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let year: i32 = cell(year_idx)
            .parse()
            .map_err(|_| malformed(format!("year '{}' is not a number", cell(year_idx))))?;
        let month: u32 = cell(month_idx)
            .parse()
            .map_err(|_| malformed(format!("month '{}' is not a number", cell(month_idx))))?;
        let period =
            Period::new(year, month).map_err(|_| malformed(format!("month {} is out of range", month)))?;
        let value: f64 = cell(value_idx)
            .parse()
            .map_err(|_| malformed(format!("value '{}' is not a number", cell(value_idx))))?;

        let mut out = row.clone();
        out.push_field(&format!("{}-01", period));
        if let Some(label) = &context.country_label {
            out.push_field(label);
        }
        let product = context
            .ncm_names
            .get(normalize_code(cell(ncm_idx)))
            .map(String::as_str)
            .unwrap_or("");
        out.push_field(product);
        out.push_field(direction.dataset_label());
        writer.write_record(&out)?;

        summary.rows_written += 1;
        summary.total_value += value;
    }

    writer.flush()?;
    Ok(summary)
}

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TradeError::DataFileNotFound {
            path: path.display().to_string(),
        },
        _ => TradeError::IoError(e),
    })
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    output.with_file_name(name)
}

/// Resolves the lookups named in `options`, then filters the input file.
/// The output file is only written when every kept row was valid.
pub fn run_extract(options: &ExtractOptions) -> Result<ExtractSummary> {
    options.validate()?;

    let mut context = ExtractContext {
        country_code: options.country_code.clone(),
        ..ExtractContext::default()
    };

    if let Some(table) = &options.country_table {
        let countries = load_lookup(
            open(table)?,
            &table.display().to_string(),
            options.delimiter,
            COUNTRY_COLUMN,
            COUNTRY_NAME_COLUMN,
        )?;
        if let Some(fragment) = &options.country_name {
            context.country_code = find_country_code(&countries, fragment).ok_or_else(|| {
                TradeError::EmptyAggregationError {
                    what: format!("country matching '{}'", fragment),
                }
            })?;
            tracing::info!("Country '{}' resolved to code {}", fragment, context.country_code);
        }
        context.country_label = countries.get(normalize_code(&context.country_code)).cloned();
    }

    if let Some(table) = &options.ncm_table {
        context.ncm_names = load_lookup(
            open(table)?,
            &table.display().to_string(),
            options.delimiter,
            NCM_COLUMN,
            NCM_NAME_COLUMN,
        )?;
    }

    let input = open(&options.input)?;
    if let Some(parent) = options.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    // Rows go to a sibling file that replaces the output only once the whole
    // input has been read.
    let partial = partial_path(&options.output);
    let output = BufWriter::new(File::create(&partial)?);

    let source = options.input.display().to_string();
    tracing::info!("Filtering {} for country {}", source, context.country_code);
    let summary = match extract_rows(
        input,
        output,
        &source,
        options.delimiter,
        options.direction,
        &context,
    ) {
        Ok(summary) => summary,
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_file(&partial) {
                tracing::warn!("Could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(e);
        }
    };
    std::fs::rename(&partial, &options.output)?;

    if summary.rows_written == 0 {
        tracing::warn!("No {} rows found for country {}", options.direction, context.country_code);
    }
    tracing::info!(
        rows_read = summary.rows_read,
        rows_written = summary.rows_written,
        "Saved {} ({:.1} million USD)",
        options.output.display(),
        summary.total_value / 1_000_000.0
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
CO_ANO;CO_MES;CO_NCM;CO_UNID;CO_PAIS;SG_UF_NCM;VL_FOB
2023;1;09011110;10;249;SP;1500000
2023;1;09011110;10;160;SP;9000000
2023;2;27090010;10;249;RJ;2500000
";

    fn context() -> ExtractContext {
        let mut ncm_names = HashMap::new();
        ncm_names.insert("9011110".to_string(), "Café não torrado".to_string());
        ExtractContext {
            country_code: UNITED_STATES_CODE.to_string(),
            country_label: None,
            ncm_names,
        }
    }

    #[test]
    fn test_extract_rows_filters_country() {
        let mut out = Vec::new();
        let summary =
            extract_rows(RAW.as_bytes(), &mut out, "raw.csv", ';', Direction::Export, &context()).unwrap();

        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.rows_written, 2);
        assert_eq!(summary.total_value, 4_000_000.0);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "CO_ANO,CO_MES,CO_NCM,CO_UNID,CO_PAIS,SG_UF_NCM,VL_FOB,Data,Produto,Tipo"
        );
        assert_eq!(
            lines[1],
            "2023,1,09011110,10,249,SP,1500000,2023-01-01,Café não torrado,Exportacao"
        );
        assert!(lines[2].ends_with("2023-02-01,,Exportacao"));
    }

    #[test]
    fn test_extract_rows_with_country_label() {
        let mut ctx = context();
        ctx.country_label = Some("Estados Unidos".to_string());
        let mut out = Vec::new();
        extract_rows(RAW.as_bytes(), &mut out, "raw.csv", ';', Direction::Import, &ctx).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().next().unwrap().ends_with("Data,Pais,Produto,Tipo"));
        assert!(text.lines().nth(1).unwrap().ends_with("Estados Unidos,Café não torrado,Importacao"));
    }

    #[test]
    fn test_extract_rows_missing_column() {
        let raw = "CO_ANO;CO_MES;CO_NCM;VL_FOB\n2023;1;1;1\n";
        let mut out = Vec::new();
        assert!(matches!(
            extract_rows(raw.as_bytes(), &mut out, "raw.csv", ';', Direction::Export, &context()),
            Err(TradeError::MissingColumnError { .. })
        ));
    }

    #[test]
    fn test_lookup_and_country_search() {
        let table = "CO_PAIS;NO_PAIS\n249;Estados Unidos\n160;China\n";
        let countries = load_lookup(table.as_bytes(), "paises.csv", ';', "CO_PAIS", "NO_PAIS").unwrap();

        assert_eq!(countries.len(), 2);
        assert_eq!(find_country_code(&countries, "ESTADOS UNIDOS").as_deref(), Some("249"));
        assert_eq!(find_country_code(&countries, "Japão"), None);
    }

    #[test]
    fn test_options_validation() {
        let mut options = ExtractOptions::new("EXP.csv", "out.csv", Direction::Export);
        assert!(options.validate().is_ok());

        options.country_name = Some("Estados".to_string());
        assert!(matches!(
            options.validate(),
            Err(TradeError::MissingConfigError { field }) if field == "country_table"
        ));

        options.country_table = Some(PathBuf::from("paises.csv"));
        assert!(options.validate().is_ok());
    }
}
