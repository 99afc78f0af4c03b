//! Tariff scenarios.
//!
//! A tariff of `p` percent on a value `v` costs `v * p / 100`; the adjusted
//! value is what remains, `v * (1 - p / 100)`. Everything here is pure.

use crate::domain::report::{ProductTable, SimulationResult, SimulationRow, SimulationSummary};
use crate::utils::error::{Result, TradeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MAX_TARIFF_PERCENT: f64 = 100.0;

fn check_value(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(TradeError::InvalidNumberError {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_tariff(percent: f64) -> Result<()> {
    check_value("tariff_percent", percent)?;
    if !(0.0..=MAX_TARIFF_PERCENT).contains(&percent) {
        return Err(TradeError::TariffRangeError { percent });
    }
    Ok(())
}

/// Amount removed from `base_value` by a tariff of `tariff_percent`.
pub fn tariff_impact(base_value: f64, tariff_percent: f64) -> Result<f64> {
    check_value("base_value", base_value)?;
    check_tariff(tariff_percent)?;
    Ok(base_value * tariff_percent / 100.0)
}

pub fn adjusted_value(base_value: f64, tariff_percent: f64) -> Result<f64> {
    let impact = tariff_impact(base_value, tariff_percent)?;
    Ok(base_value - impact)
}

/// Parses a user-typed number. Accepts surrounding spaces and a decimal comma.
pub fn parse_number(field: &str, input: &str) -> Result<f64> {
    let cleaned = input.trim().replace(',', ".");
    let invalid = || TradeError::InvalidNumberError {
        field: field.to_string(),
        value: input.to_string(),
    };
    let value: f64 = cleaned.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

/// Parses a tariff such as `10`, `2.5%` or `2,5 %` and checks its range.
pub fn parse_tariff_percent(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    let percent = parse_number("tariff_percent", number)?;
    check_tariff(percent)?;
    Ok(percent)
}

/// Uniform tariff scenarios applied to every product at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioPreset {
    PreTrump,
    PostTrump,
    Extreme,
    Reset,
}

impl ScenarioPreset {
    pub fn percent(&self) -> f64 {
        match self {
            ScenarioPreset::PreTrump => 2.0,
            ScenarioPreset::PostTrump => 10.0,
            ScenarioPreset::Extreme => 50.0,
            ScenarioPreset::Reset => 0.0,
        }
    }
}

impl FromStr for ScenarioPreset {
    type Err = TradeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pre-trump" => Ok(ScenarioPreset::PreTrump),
            "post-trump" => Ok(ScenarioPreset::PostTrump),
            "extreme" => Ok(ScenarioPreset::Extreme),
            "reset" => Ok(ScenarioPreset::Reset),
            other => Err(TradeError::InvalidConfigValueError {
                field: "tariff.preset".to_string(),
                value: other.to_string(),
                reason: "Expected pre-trump, post-trump, extreme or reset".to_string(),
            }),
        }
    }
}

impl fmt::Display for ScenarioPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScenarioPreset::PreTrump => "pre-trump",
            ScenarioPreset::PostTrump => "post-trump",
            ScenarioPreset::Extreme => "extreme",
            ScenarioPreset::Reset => "reset",
        };
        write!(f, "{} ({}%)", name, self.percent())
    }
}

/// Base tariff for products whose label contains one of `keywords`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffRule {
    pub keywords: Vec<String>,
    pub percent: f64,
}

impl TariffRule {
    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| label.contains(&keyword.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffPolicy {
    pub default_percent: f64,
    pub rules: Vec<TariffRule>,
    pub preset: Option<ScenarioPreset>,
    /// Product code to tariff; wins over presets and rules.
    pub overrides: BTreeMap<String, f64>,
}

impl Default for TariffPolicy {
    fn default() -> Self {
        Self {
            default_percent: 5.0,
            rules: vec![
                TariffRule {
                    keywords: vec!["Petróleo".to_string(), "Açúcar".to_string()],
                    percent: 0.0,
                },
                TariffRule {
                    keywords: vec!["Aeronave".to_string(), "Máquina".to_string()],
                    percent: 2.5,
                },
            ],
            preset: None,
            overrides: BTreeMap::new(),
        }
    }
}

impl TariffPolicy {
    pub fn base_tariff(&self, label: &str) -> f64 {
        self.rules
            .iter()
            .find(|rule| rule.matches(label))
            .map(|rule| rule.percent)
            .unwrap_or(self.default_percent)
    }

    pub fn tariff_for(&self, product_code: &str, label: &str) -> f64 {
        if let Some(percent) = self.overrides.get(product_code) {
            return *percent;
        }
        match self.preset {
            Some(preset) => preset.percent(),
            None => self.base_tariff(label),
        }
    }

    /// Adds an override written as `CODE=PERCENT`.
    pub fn apply_override(&mut self, entry: &str) -> Result<()> {
        let (code, percent) = entry
            .split_once('=')
            .ok_or_else(|| TradeError::InvalidConfigValueError {
                field: "tariff".to_string(),
                value: entry.to_string(),
                reason: "Expected CODE=PERCENT".to_string(),
            })?;
        let code = code.trim();
        if code.is_empty() {
            return Err(TradeError::InvalidConfigValueError {
                field: "tariff".to_string(),
                value: entry.to_string(),
                reason: "Product code cannot be empty".to_string(),
            });
        }
        let percent = parse_tariff_percent(percent)?;
        self.overrides.insert(code.to_string(), percent);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_tariff(self.default_percent)?;
        for rule in &self.rules {
            check_tariff(rule.percent)?;
            if rule.keywords.iter().all(|k| k.trim().is_empty()) {
                return Err(TradeError::ConfigValidationError {
                    field: "tariff.rules".to_string(),
                    message: "every rule needs at least one keyword".to_string(),
                });
            }
        }
        for percent in self.overrides.values() {
            check_tariff(*percent)?;
        }
        Ok(())
    }
}

/// Applies `policy` to every row of `table`, including the "Others" row.
pub fn simulate(
    table: &ProductTable,
    policy: &TariffPolicy,
    gdp_usd_billions: f64,
) -> Result<SimulationResult> {
    let mut rows = Vec::with_capacity(table.rows.len() + 1);
    let mut total_export = 0.0;
    let mut total_impact = 0.0;
    let mut weighted_sum = 0.0;

    for share in table.all_rows() {
        let tariff = policy.tariff_for(&share.product_code, &share.product_label);
        let impact = tariff_impact(share.value_usd_millions, tariff)?;

        total_export += share.value_usd_millions;
        total_impact += impact;
        weighted_sum += tariff * share.value_usd_millions;

        rows.push(SimulationRow {
            product_code: share.product_code.clone(),
            product_label: share.product_label.clone(),
            value_usd_millions: share.value_usd_millions,
            share_percent: share.share_percent,
            tariff_percent: tariff,
            impact_usd_millions: impact,
            adjusted_value_usd_millions: share.value_usd_millions - impact,
        });
    }

    let weighted_tariff_percent = if total_export > 0.0 {
        weighted_sum / total_export
    } else {
        0.0
    };
    let impact_gdp_percent =
        (total_impact > 0.0).then(|| total_impact / 1000.0 / gdp_usd_billions * 100.0);

    tracing::debug!(
        rows = rows.len(),
        weighted_tariff_percent,
        total_impact,
        "Tariff simulation finished"
    );

    Ok(SimulationResult {
        rows,
        summary: SimulationSummary {
            total_export_usd_millions: total_export,
            weighted_tariff_percent,
            total_impact_usd_millions: total_impact,
            impact_gdp_percent,
        },
    })
}
