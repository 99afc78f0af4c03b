use crate::utils::error::{Result, TradeError};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Export,
    Import,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Export => "export",
            Direction::Import => "import",
        }
    }

    /// Value written to the `Tipo` column of extracted files.
    pub fn dataset_label(&self) -> &'static str {
        match self {
            Direction::Export => "Exportacao",
            Direction::Import => "Importacao",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "export" | "exports" | "exportacao" => Ok(Direction::Export),
            "import" | "imports" | "importacao" => Ok(Direction::Import),
            other => Err(TradeError::InvalidConfigValueError {
                field: "direction".to_string(),
                value: other.to_string(),
                reason: "Expected 'export' or 'import'".to_string(),
            }),
        }
    }
}

/// A calendar month. Ordered chronologically and displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Period {
    year: i32,
    month: u32,
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(TradeError::InvalidNumberError {
                field: "month".to_string(),
                value: month.to_string(),
            });
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Months since year 0, used for month arithmetic.
    pub fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    pub fn from_index(index: i64) -> Self {
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn add_months(self, months: i64) -> Self {
        Self::from_index(self.index() + months)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Parses the date forms found in trade datasets: full dates, datetimes,
    /// `YYYY-MM` and `YYYYMM`.
    pub fn parse(input: &str) -> Result<Self> {
        let value = input.trim();
        let invalid = || TradeError::InvalidNumberError {
            field: "period".to_string(),
            value: value.to_string(),
        };

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(value, format) {
                return Ok(Self::from_date(date));
            }
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
                return Ok(Self::from_date(datetime.date()));
            }
        }

        let (year, month) = match value.split_once('-') {
            Some((y, m)) => (y, m),
            None if value.len() == 6 && value.chars().all(|c| c.is_ascii_digit()) => {
                value.split_at(4)
            }
            None => return Err(invalid()),
        };
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Period::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub product_code: String,
    pub product_name: Option<String>,
    pub period: Period,
    pub direction: Direction,
    pub value_usd_millions: f64,
}

impl TradeRecord {
    pub fn product_label(&self) -> &str {
        self.product_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.product_code)
    }
}

/// Export and import records of one session.
#[derive(Debug, Clone, Default)]
pub struct TradeDataset {
    pub exports: Vec<TradeRecord>,
    pub imports: Vec<TradeRecord>,
}

impl TradeDataset {
    pub fn new(exports: Vec<TradeRecord>, imports: Vec<TradeRecord>) -> Self {
        Self { exports, imports }
    }

    pub fn records(&self, direction: Direction) -> &[TradeRecord] {
        match direction {
            Direction::Export => &self.exports,
            Direction::Import => &self.imports,
        }
    }

    pub fn len(&self) -> usize {
        self.exports.len() + self.imports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty() && self.imports.is_empty()
    }

    pub fn latest_period(&self) -> Option<Period> {
        self.exports
            .iter()
            .chain(&self.imports)
            .map(|r| r.period)
            .max()
    }

    /// Product code to display label, across both directions.
    pub fn product_catalog(&self) -> BTreeMap<String, String> {
        let mut catalog = BTreeMap::new();
        for record in self.exports.iter().chain(&self.imports) {
            catalog
                .entry(record.product_code.clone())
                .or_insert_with(|| record.product_label().to_string());
        }
        catalog
    }

    /// Finds a product by exact code, then by case-insensitive name.
    pub fn resolve_product(&self, query: &str) -> Option<String> {
        let query = query.trim();
        let catalog = self.product_catalog();
        if catalog.contains_key(query) {
            return Some(query.to_string());
        }
        let lowered = query.to_lowercase();
        catalog
            .into_iter()
            .find(|(_, label)| label.to_lowercase() == lowered)
            .map(|(code, _)| code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, name: Option<&str>, period: &str, value: f64) -> TradeRecord {
        TradeRecord {
            product_code: code.to_string(),
            product_name: name.map(str::to_string),
            period: Period::parse(period).unwrap(),
            direction: Direction::Export,
            value_usd_millions: value,
        }
    }

    #[test]
    fn test_period_parse_forms() {
        let expected = Period::new(2024, 3).unwrap();
        for input in [
            "2024-03-01",
            "2024-03-01 00:00:00",
            "2024-03-15T10:00:00",
            "2024-03",
            "202403",
            "15/03/2024",
        ] {
            assert_eq!(Period::parse(input).unwrap(), expected, "input {}", input);
        }
        assert!(Period::parse("2024-13").is_err());
        assert!(Period::parse("march").is_err());
        assert!(Period::parse("").is_err());
    }

    #[test]
    fn test_period_arithmetic_and_display() {
        let period = Period::new(2024, 1).unwrap();
        assert_eq!(period.add_months(-1).to_string(), "2023-12");
        assert_eq!(period.add_months(11).to_string(), "2024-12");
        assert_eq!(period.add_months(12), Period::new(2025, 1).unwrap());
        assert!(Period::new(2023, 12).unwrap() < period);
    }

    #[test]
    fn test_period_serde_as_string() {
        let period = Period::new(2020, 7).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2020-07\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("Export".parse::<Direction>().unwrap(), Direction::Export);
        assert_eq!("importacao".parse::<Direction>().unwrap(), Direction::Import);
        assert!("both".parse::<Direction>().is_err());
    }

    #[test]
    fn test_resolve_product_by_code_or_name() {
        let dataset = TradeDataset::new(
            vec![
                record("27090010", Some("Óleos brutos de petróleo"), "2024-01", 10.0),
                record("88024090", None, "2024-01", 5.0),
            ],
            vec![],
        );
        assert_eq!(dataset.resolve_product("88024090").as_deref(), Some("88024090"));
        assert_eq!(
            dataset.resolve_product("ÓLEOS BRUTOS DE PETRÓLEO").as_deref(),
            Some("27090010")
        );
        assert!(dataset.resolve_product("café").is_none());
        assert_eq!(dataset.latest_period(), Some(Period::new(2024, 1).unwrap()));
    }
}
