use crate::config::toml_config::SchemaConfig;
use crate::core::Storage;
use crate::domain::model::{Direction, Period, TradeRecord};
use crate::utils::error::{Result, TradeError};
use csv::{ReaderBuilder, StringRecord, Trim};

enum PeriodColumns {
    Date(usize),
    YearMonth { year: usize, month: usize },
}

struct ColumnIndex {
    period: PeriodColumns,
    product_code: usize,
    product_name: Option<usize>,
    value: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, schema: &SchemaConfig, source: &str) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| TradeError::MissingColumnError {
                file: source.to_string(),
                column: name.to_string(),
            })
        };

        let period = match find(&schema.date_column) {
            Some(idx) => PeriodColumns::Date(idx),
            None => match (find(&schema.year_column), find(&schema.month_column)) {
                (Some(year), Some(month)) => PeriodColumns::YearMonth { year, month },
                _ => {
                    return Err(TradeError::MissingColumnError {
                        file: source.to_string(),
                        column: schema.date_column.clone(),
                    })
                }
            },
        };

        Ok(Self {
            period,
            product_code: require(&schema.product_code_column)?,
            product_name: schema
                .product_name_column
                .as_deref()
                .and_then(|name| find(name)),
            value: require(&schema.value_column)?,
        })
    }
}

/// Parses delimited trade data into records of one direction.
///
/// A file without content (or with only a header) gives no records. Rows
/// whose value cell is empty are skipped.
pub fn parse_records(
    bytes: &[u8],
    source: &str,
    direction: Direction,
    schema: &SchemaConfig,
) -> Result<Vec<TradeRecord>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        tracing::warn!("{} is empty, no {} records loaded", source, direction);
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(schema.delimiter as u8)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::resolve(&headers, schema, source)?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row.map_err(|e| TradeError::ParseError {
            file: source.to_string(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let malformed = |message: String| TradeError::ParseError {
            file: source.to_string(),
            line,
            message,
        };
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let raw_value = cell(columns.value);
        if raw_value.is_empty() {
            skipped += 1;
            continue;
        }
        let value: f64 = raw_value
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| malformed(format!("value '{}' is not a number", raw_value)))?;

        let period = match columns.period {
            PeriodColumns::Date(idx) => Period::parse(cell(idx))
                .map_err(|_| malformed(format!("date '{}' is not recognized", cell(idx))))?,
            PeriodColumns::YearMonth { year, month } => {
                let y: i32 = cell(year)
                    .parse()
                    .map_err(|_| malformed(format!("year '{}' is not a number", cell(year))))?;
                let m: u32 = cell(month)
                    .parse()
                    .map_err(|_| malformed(format!("month '{}' is not a number", cell(month))))?;
                Period::new(y, m).map_err(|_| malformed(format!("month {} is out of range", m)))?
            }
        };

        let product_code = cell(columns.product_code);
        if product_code.is_empty() {
            return Err(malformed("product code is empty".to_string()));
        }
        let product_name = columns
            .product_name
            .map(cell)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        records.push(TradeRecord {
            product_code: product_code.to_string(),
            product_name,
            period,
            direction,
            value_usd_millions: value / schema.value_divisor,
        });
    }

    if skipped > 0 {
        tracing::warn!("{}: skipped {} rows without a value", source, skipped);
    }
    tracing::debug!("{}: parsed {} {} records", source, records.len(), direction);

    Ok(records)
}

/// Reads `path` through `storage` and parses it.
pub async fn load_records<S: Storage>(
    storage: &S,
    path: &str,
    direction: Direction,
    schema: &SchemaConfig,
) -> Result<Vec<TradeRecord>> {
    let bytes = storage.read_file(path).await.map_err(|e| match e {
        TradeError::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            TradeError::DataFileNotFound {
                path: path.to_string(),
            }
        }
        other => other,
    })?;
    parse_records(&bytes, path, direction, schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
CO_ANO,CO_MES,CO_NCM,CO_PAIS,VL_FOB,Data,Produto,Tipo
2020,1,10019900,249,100000000,2020-01-01,Trigo,Exportacao
2020,1,10019900,249,50000000,2020-01-01,Trigo,Exportacao
2020,2,27090010,249,2500000,2020-02-01,Óleos brutos de petróleo,Exportacao
";

    #[test]
    fn test_parse_records_converts_to_millions() {
        let records =
            parse_records(SAMPLE.as_bytes(), "exp.csv", Direction::Export, &SchemaConfig::default())
                .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].product_code, "10019900");
        assert_eq!(records[0].product_name.as_deref(), Some("Trigo"));
        assert_eq!(records[0].period, Period::new(2020, 1).unwrap());
        assert_eq!(records[0].value_usd_millions, 100.0);
        assert_eq!(records[2].value_usd_millions, 2.5);
        assert!(records.iter().all(|r| r.direction == Direction::Export));
    }

    #[test]
    fn test_empty_and_header_only_files() {
        let schema = SchemaConfig::default();
        assert!(parse_records(b"", "exp.csv", Direction::Export, &schema)
            .unwrap()
            .is_empty());
        assert!(parse_records(b"\n  \n", "exp.csv", Direction::Export, &schema)
            .unwrap()
            .is_empty());

        let header_only = "CO_NCM,VL_FOB,Data\n";
        assert!(parse_records(header_only.as_bytes(), "exp.csv", Direction::Export, &schema)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_year_month_columns_when_date_missing() {
        let data = "CO_ANO;CO_MES;CO_NCM;VL_FOB\n2023;12;0901;1500000\n";
        let schema = SchemaConfig {
            delimiter: ';',
            ..SchemaConfig::default()
        };
        let records = parse_records(data.as_bytes(), "imp.csv", Direction::Import, &schema).unwrap();

        assert_eq!(records[0].period, Period::new(2023, 12).unwrap());
        assert_eq!(records[0].product_name, None);
        assert_eq!(records[0].product_label(), "0901");
        assert_eq!(records[0].value_usd_millions, 1.5);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let data = "Data,CO_NCM,VALOR\n2020-01-01,1001,10\n";
        let err = parse_records(data.as_bytes(), "exp.csv", Direction::Export, &SchemaConfig::default())
            .unwrap_err();
        match err {
            TradeError::MissingColumnError { file, column } => {
                assert_eq!(file, "exp.csv");
                assert_eq!(column, "VL_FOB");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_value_reports_line() {
        let data = "Data,CO_NCM,VL_FOB\n2020-01-01,1001,10\n2020-02-01,1001,abc\n";
        let err = parse_records(data.as_bytes(), "exp.csv", Direction::Export, &SchemaConfig::default())
            .unwrap_err();
        match err {
            TradeError::ParseError { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("abc"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_date_and_empty_value() {
        let schema = SchemaConfig::default();
        let bad_date = "Data,CO_NCM,VL_FOB\nsometime,1001,10\n";
        assert!(matches!(
            parse_records(bad_date.as_bytes(), "exp.csv", Direction::Export, &schema),
            Err(TradeError::ParseError { .. })
        ));

        let empty_value = "Data,CO_NCM,VL_FOB\n2020-01-01,1001,\n2020-01-01,1001,2000000\n";
        let records =
            parse_records(empty_value.as_bytes(), "exp.csv", Direction::Export, &schema).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value_usd_millions, 2.0);
    }
}
