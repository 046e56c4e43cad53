//! CSV file data adapter.
//!
//! Bars: `begin,end,open,high,low,close,volume,trades` with RFC 3339 times.
//! Positions: `entry_index,exit_index` with an empty exit for an open
//! position.

use crate::domain::error::BarstreamError;
use crate::domain::num::NumFactory;
use crate::domain::ohlcv::Bar;
use crate::domain::record::PositionSpan;
use crate::domain::series::BarSeries;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    bars_path: PathBuf,
    positions_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(bars_path: impl Into<PathBuf>) -> Self {
        Self {
            bars_path: bars_path.into(),
            positions_path: None,
        }
    }

    pub fn with_positions(mut self, positions_path: impl Into<PathBuf>) -> Self {
        self.positions_path = Some(positions_path.into());
        self
    }
}

/// One CSV row being decoded, for error reporting.
struct Row<'a> {
    source: &'a Path,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn error(&self, reason: impl Into<String>) -> BarstreamError {
        BarstreamError::DataParse {
            source_name: self.source.display().to_string(),
            line: self.record.position().map_or(0, |p| p.line()),
            reason: reason.into(),
        }
    }

    fn field(&self, index: usize, name: &str) -> Result<&str, BarstreamError> {
        self.record
            .get(index)
            .ok_or_else(|| self.error(format!("missing {name} column")))
    }

    fn time(&self, index: usize, name: &str) -> Result<DateTime<Utc>, BarstreamError> {
        let text = self.field(index, name)?;
        DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| self.error(format!("invalid {name} time '{text}': {e}")))
    }

    fn number<F: NumFactory>(
        &self,
        index: usize,
        name: &str,
        factory: &F,
    ) -> Result<F::Num, BarstreamError> {
        let text = self.field(index, name)?;
        factory
            .parse(text)
            .ok_or_else(|| self.error(format!("invalid {name} value '{text}'")))
    }

    fn index(&self, index: usize, name: &str) -> Result<Option<usize>, BarstreamError> {
        let text = self.record.get(index).unwrap_or("");
        if text.is_empty() {
            return Ok(None);
        }
        text.parse()
            .map(Some)
            .map_err(|e| self.error(format!("invalid {name} '{text}': {e}")))
    }
}

fn read_records(path: &Path) -> Result<Vec<csv::StringRecord>, BarstreamError> {
    let content = fs::read_to_string(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    rdr.records()
        .map(|result| {
            result.map_err(|e| BarstreamError::DataParse {
                source_name: path.display().to_string(),
                line: e.position().map_or(0, |p| p.line()),
                reason: format!("CSV parse error: {e}"),
            })
        })
        .collect()
}

impl DataPort for CsvAdapter {
    fn load_bars<F: NumFactory>(&self, factory: &F) -> Result<BarSeries<F::Num>, BarstreamError> {
        let path = self.bars_path.as_path();
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());
        let mut series = BarSeries::new(name);

        for record in read_records(path)? {
            let row = Row {
                source: path,
                record: &record,
            };
            let trades = match row.record.get(7) {
                Some(text) if !text.is_empty() => text
                    .parse()
                    .map_err(|e| row.error(format!("invalid trades '{text}': {e}")))?,
                _ => 0,
            };
            let bar = Bar {
                begin: row.time(0, "begin")?,
                end: row.time(1, "end")?,
                open: row.number(2, "open", factory)?,
                high: row.number(3, "high", factory)?,
                low: row.number(4, "low", factory)?,
                close: row.number(5, "close", factory)?,
                volume: row.number(6, "volume", factory)?,
                trades,
            };
            if bar.begin > bar.end {
                return Err(row.error("begin is after end"));
            }
            series.add_bar(bar);
        }
        Ok(series)
    }

    fn load_positions(&self) -> Result<Vec<PositionSpan>, BarstreamError> {
        let Some(path) = self.positions_path.as_deref() else {
            return Ok(Vec::new());
        };
        let mut spans = Vec::new();
        for record in read_records(path)? {
            let row = Row {
                source: path,
                record: &record,
            };
            let entry_index = row
                .index(0, "entry_index")?
                .ok_or_else(|| row.error("missing entry_index"))?;
            let exit_index = row.index(1, "exit_index")?;
            if let Some(exit) = exit_index {
                if exit <= entry_index {
                    return Err(row.error(format!(
                        "exit_index {exit} does not follow entry_index {entry_index}"
                    )));
                }
            }
            spans.push(PositionSpan {
                entry_index,
                exit_index,
            });
        }
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::num::{DecimalFactory, DoubleFactory};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::TempDir;

    const HEADER: &str = "begin,end,open,high,low,close,volume,trades\n";

    fn setup(bars: &str, positions: &str) -> (TempDir, CsvAdapter) {
        let dir = TempDir::new().unwrap();
        let bars_path = dir.path().join("BHP.csv");
        let positions_path = dir.path().join("positions.csv");
        fs::write(&bars_path, format!("{HEADER}{bars}")).unwrap();
        fs::write(&positions_path, format!("entry_index,exit_index\n{positions}")).unwrap();
        let adapter = CsvAdapter::new(bars_path).with_positions(positions_path);
        (dir, adapter)
    }

    const BARS: &str = "\
2024-01-15T00:00:00Z,2024-01-16T00:00:00Z,100.0,110.0,90.0,105.0,50000,120
2024-01-16T00:00:00Z,2024-01-17T00:00:00Z,105.0,115.0,100.0,110.1,60000,
";

    #[test]
    fn load_bars_returns_correct_data() {
        let (_dir, adapter) = setup(BARS, "");
        let series = adapter.load_bars(&DoubleFactory).unwrap();

        assert_eq!(series.name(), "BHP");
        assert_eq!(series.len(), 2);
        let bar = series.bar(0).unwrap();
        assert_eq!(bar.open, 100.0);
        assert_eq!(bar.high, 110.0);
        assert_eq!(bar.low, 90.0);
        assert_eq!(bar.close, 105.0);
        assert_eq!(bar.volume, 50000.0);
        assert_eq!(bar.trades, 120);
        assert_eq!(bar.period(), chrono::TimeDelta::days(1));
        assert_eq!(series.bar(1).unwrap().trades, 0);
    }

    #[test]
    fn load_bars_keeps_decimal_precision() {
        let (_dir, adapter) = setup(BARS, "");
        let series = adapter.load_bars(&DecimalFactory).unwrap();
        assert_eq!(series.bar(1).unwrap().close, Decimal::from_str("110.1").unwrap());
    }

    #[test]
    fn load_bars_drops_out_of_order_rows() {
        let rows = "\
2024-01-16T00:00:00Z,2024-01-17T00:00:00Z,1,1,1,1,1,0
2024-01-15T00:00:00Z,2024-01-16T00:00:00Z,2,2,2,2,2,0
";
        let (_dir, adapter) = setup(rows, "");
        let series = adapter.load_bars(&DoubleFactory).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bar(0).unwrap().close, 1.0);
    }

    #[test]
    fn load_bars_reports_bad_row() {
        let rows = "2024-01-15T00:00:00Z,2024-01-16T00:00:00Z,1,1,1,abc,1,0\n";
        let (_dir, adapter) = setup(rows, "");
        let err = adapter.load_bars(&DoubleFactory).unwrap_err();
        match err {
            BarstreamError::DataParse { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("close"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_bars_rejects_bad_time() {
        let rows = "yesterday,2024-01-16T00:00:00Z,1,1,1,1,1,0\n";
        let (_dir, adapter) = setup(rows, "");
        let err = adapter.load_bars(&DoubleFactory).unwrap_err();
        assert!(matches!(err, BarstreamError::DataParse { .. }));
    }

    #[test]
    fn load_bars_missing_file_is_io_error() {
        let adapter = CsvAdapter::new("/nonexistent/bars.csv");
        let err = adapter.load_bars(&DoubleFactory).unwrap_err();
        assert!(matches!(err, BarstreamError::Io(_)));
    }

    #[test]
    fn load_positions_reads_open_and_closed() {
        let (_dir, adapter) = setup(BARS, "0,3\n5,\n");
        let spans = adapter.load_positions().unwrap();
        assert_eq!(
            spans,
            vec![
                PositionSpan {
                    entry_index: 0,
                    exit_index: Some(3)
                },
                PositionSpan {
                    entry_index: 5,
                    exit_index: None
                },
            ]
        );
    }

    #[test]
    fn load_positions_rejects_backwards_span() {
        let (_dir, adapter) = setup(BARS, "4,2\n");
        assert!(adapter.load_positions().is_err());
    }

    #[test]
    fn load_positions_without_file_is_empty() {
        let adapter = CsvAdapter::new("bars.csv");
        assert!(adapter.load_positions().unwrap().is_empty());
    }
}
