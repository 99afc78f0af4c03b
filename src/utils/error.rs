use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Data file not found: {path}")]
    DataFileNotFound { path: String },

    #[error("Malformed data in {file} at line {line}: {message}")]
    ParseError {
        file: String,
        line: u64,
        message: String,
    },

    #[error("Column '{column}' is missing from {file}")]
    MissingColumnError { file: String, column: String },

    #[error("Invalid numeric input for {field}: '{value}'")]
    InvalidNumberError { field: String, value: String },

    #[error("Tariff of {percent}% is outside the 0-100 range")]
    TariffRangeError { percent: f64 },

    #[error("No matching rows: {what}")]
    EmptyAggregationError { what: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TradeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TradeError::InvalidNumberError { .. } | TradeError::TariffRangeError { .. } => {
                ErrorCategory::Input
            }
            TradeError::DataFileNotFound { .. }
            | TradeError::ParseError { .. }
            | TradeError::MissingColumnError { .. }
            | TradeError::EmptyAggregationError { .. }
            | TradeError::CsvError(_) => ErrorCategory::Data,
            TradeError::ConfigError { .. }
            | TradeError::ConfigValidationError { .. }
            | TradeError::InvalidConfigValueError { .. }
            | TradeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            TradeError::ZipError(_) | TradeError::IoError(_) | TradeError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TradeError::EmptyAggregationError { .. } => ErrorSeverity::Low,
            TradeError::ParseError { .. } | TradeError::CsvError(_) => ErrorSeverity::Medium,
            TradeError::ZipError(_) | TradeError::IoError(_) | TradeError::SerializationError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            TradeError::DataFileNotFound { .. } => {
                "Place the export and import CSV files in the data directory or pass --exports/--imports"
            }
            TradeError::ParseError { .. } | TradeError::CsvError(_) => {
                "Check the file delimiter and the date/value formats of the reported line"
            }
            TradeError::MissingColumnError { .. } => {
                "Map the dataset's column names in the [schema] section of the config file"
            }
            TradeError::InvalidNumberError { .. } => "Use a plain number such as 10 or 12.5%",
            TradeError::TariffRangeError { .. } => "Use a tariff between 0 and 100 percent",
            TradeError::EmptyAggregationError { .. } => {
                "Pick another product or direction, or check the dataset period"
            }
            TradeError::ConfigError { .. }
            | TradeError::ConfigValidationError { .. }
            | TradeError::InvalidConfigValueError { .. }
            | TradeError::MissingConfigError { .. } => "Review the configuration file and CLI flags",
            TradeError::ZipError(_) | TradeError::IoError(_) => {
                "Check file permissions and free disk space"
            }
            TradeError::SerializationError(_) => "Report the issue with the --verbose output",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            TradeError::DataFileNotFound { path } => format!("Trade data file '{}' was not found", path),
            TradeError::ParseError { file, line, .. } => {
                format!("Could not read {} (line {})", file, line)
            }
            TradeError::InvalidNumberError { value, .. } => {
                format!("'{}' is not a valid number", value)
            }
            TradeError::EmptyAggregationError { what } => format!("No data for {}", what),
            other => other.to_string(),
        }
    }

    /// Process exit code for the CLI binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, TradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_maps_to_exit_code() {
        let empty = TradeError::EmptyAggregationError {
            what: "product 1001".to_string(),
        };
        assert_eq!(empty.severity(), ErrorSeverity::Low);
        assert_eq!(empty.exit_code(), 0);

        let missing = TradeError::DataFileNotFound {
            path: "exports.csv".to_string(),
        };
        assert_eq!(missing.category(), ErrorCategory::Data);
        assert_eq!(missing.exit_code(), 1);

        let io = TradeError::IoError(std::io::Error::other("disk"));
        assert_eq!(io.exit_code(), 3);
    }

    #[test]
    fn test_user_friendly_message() {
        let err = TradeError::InvalidNumberError {
            field: "tariff".to_string(),
            value: "abc".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "'abc' is not a valid number");
        assert_eq!(err.category(), ErrorCategory::Input);
    }
}
