//! Configuration validation.
//!
//! Each section is read into a typed settings value; reading fails with the
//! offending section and key before anything runs.

use std::collections::HashSet;
use std::fmt;

use crate::domain::error::BarstreamError;
use crate::domain::indicator::IndicatorType;
use crate::domain::position::TradeKind;
use crate::domain::valuation::ReturnType;
use crate::ports::config_port::ConfigPort;

/// Number representation selected in `[engine] numeric`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericKind {
    #[default]
    Double,
    Decimal,
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericKind::Double => write!(f, "double"),
            NumericKind::Decimal => write!(f, "decimal"),
        }
    }
}

/// `[valuation]` section with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationSettings {
    pub transaction_fee: f64,
    pub borrowing_fee: f64,
    pub return_type: ReturnType,
    pub start_with: TradeKind,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            transaction_fee: 0.0,
            borrowing_fee: 0.0,
            return_type: ReturnType::Log,
            start_with: TradeKind::Buy,
        }
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> BarstreamError {
    BarstreamError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> BarstreamError {
    BarstreamError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Validates every section the engine reads.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BarstreamError> {
    numeric_kind(config)?;
    indicator_specs(config)?;
    valuation_settings(config)?;
    Ok(())
}

pub fn numeric_kind(config: &dyn ConfigPort) -> Result<NumericKind, BarstreamError> {
    match config.get_string("engine", "numeric") {
        None => Ok(NumericKind::default()),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "double" => Ok(NumericKind::Double),
            "decimal" => Ok(NumericKind::Decimal),
            other => Err(invalid(
                "engine",
                "numeric",
                format!("expected 'double' or 'decimal', got '{other}'"),
            )),
        },
    }
}

/// `(name, spec)` pairs from `[indicators]` in the order given by `names`.
/// Every spec is parsed so syntax errors surface here.
pub fn indicator_specs(config: &dyn ConfigPort) -> Result<Vec<(String, String)>, BarstreamError> {
    let names = config.get_list("indicators", "names");
    if names.is_empty() {
        return Err(missing("indicators", "names"));
    }

    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(invalid("indicators", "names", format!("duplicate name '{name}'")));
        }
        let spec = match config.get_string("indicators", &name) {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return Err(missing("indicators", &name)),
        };
        spec.parse::<IndicatorType>()
            .map_err(|e| invalid("indicators", &name, e.to_string()))?;
        specs.push((name, spec));
    }
    Ok(specs)
}

pub fn valuation_settings(config: &dyn ConfigPort) -> Result<ValuationSettings, BarstreamError> {
    let defaults = ValuationSettings::default();
    let transaction_fee = non_negative(config, "transaction_fee")?;
    let borrowing_fee = non_negative(config, "borrowing_fee")?;

    let return_type = match config.get_string("valuation", "return_type") {
        None => defaults.return_type,
        Some(value) => value
            .parse()
            .map_err(|e: BarstreamError| invalid("valuation", "return_type", e.to_string()))?,
    };

    let start_with = match config.get_string("valuation", "start_with") {
        None => defaults.start_with,
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "buy" => TradeKind::Buy,
            "sell" => TradeKind::Sell,
            other => {
                return Err(invalid(
                    "valuation",
                    "start_with",
                    format!("expected 'buy' or 'sell', got '{other}'"),
                ));
            }
        },
    };

    Ok(ValuationSettings {
        transaction_fee,
        borrowing_fee,
        return_type,
        start_with,
    })
}

fn non_negative(config: &dyn ConfigPort, key: &str) -> Result<f64, BarstreamError> {
    let Some(text) = config.get_string("valuation", key) else {
        return Ok(0.0);
    };
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| invalid("valuation", key, format!("'{text}' is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid("valuation", key, format!("{key} must be non-negative")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[engine]
numeric = decimal

[indicators]
names = fast, slow, adx
fast = SMA(5)
slow = EMA(20)
adx = ADX(14)

[valuation]
transaction_fee = 0.001
borrowing_fee = 0.0
return_type = arithmetic
start_with = sell
"#,
        );
        assert!(validate_config(&config).is_ok());
        assert_eq!(numeric_kind(&config).unwrap(), NumericKind::Decimal);
        let settings = valuation_settings(&config).unwrap();
        assert_eq!(settings.return_type, ReturnType::Arithmetic);
        assert_eq!(settings.start_with, TradeKind::Sell);
        assert_eq!(settings.transaction_fee, 0.001);
    }

    #[test]
    fn indicator_order_follows_names() {
        let config =
            make_config("[indicators]\nnames = b, a\na = SMA(2)\nb = CLOSE\n");
        let specs = indicator_specs(&config).unwrap();
        assert_eq!(
            specs,
            vec![
                ("b".to_string(), "CLOSE".to_string()),
                ("a".to_string(), "SMA(2)".to_string())
            ]
        );
    }

    #[test]
    fn numeric_defaults_to_double() {
        let config = make_config("[engine]\n");
        assert_eq!(numeric_kind(&config).unwrap(), NumericKind::Double);
    }

    #[test]
    fn unknown_numeric_fails() {
        let config = make_config("[engine]\nnumeric = float\n");
        let err = numeric_kind(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigInvalid { key, .. } if key == "numeric"));
    }

    #[test]
    fn missing_names_fails() {
        let config = make_config("[indicators]\nfast = SMA(5)\n");
        let err = indicator_specs(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigMissing { key, .. } if key == "names"));
    }

    #[test]
    fn missing_spec_fails() {
        let config = make_config("[indicators]\nnames = fast\n");
        let err = indicator_specs(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigMissing { key, .. } if key == "fast"));
    }

    #[test]
    fn duplicate_name_fails() {
        let config = make_config("[indicators]\nnames = fast, fast\nfast = SMA(5)\n");
        let err = indicator_specs(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigInvalid { key, .. } if key == "names"));
    }

    #[test]
    fn malformed_spec_fails() {
        let config = make_config("[indicators]\nnames = fast\nfast = SMA(five)\n");
        let err = indicator_specs(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigInvalid { key, .. } if key == "fast"));
    }

    #[test]
    fn negative_fee_fails() {
        let config = make_config("[valuation]\ntransaction_fee = -0.1\n");
        let err = valuation_settings(&config).unwrap_err();
        assert!(
            matches!(err, BarstreamError::ConfigInvalid { key, .. } if key == "transaction_fee")
        );
    }

    #[test]
    fn non_numeric_fee_fails() {
        let config = make_config("[valuation]\nborrowing_fee = cheap\n");
        let err = valuation_settings(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigInvalid { key, .. } if key == "borrowing_fee"));
    }

    #[test]
    fn bad_return_type_fails() {
        let config = make_config("[valuation]\nreturn_type = simple\n");
        let err = valuation_settings(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigInvalid { key, .. } if key == "return_type"));
    }

    #[test]
    fn bad_start_with_fails() {
        let config = make_config("[valuation]\nstart_with = hold\n");
        let err = valuation_settings(&config).unwrap_err();
        assert!(matches!(err, BarstreamError::ConfigInvalid { key, .. } if key == "start_with"));
    }

    #[test]
    fn valuation_defaults() {
        let config = make_config("[engine]\n");
        assert_eq!(valuation_settings(&config).unwrap(), ValuationSettings::default());
    }
}
