#![allow(dead_code)]

use barstream::domain::error::BarstreamError;
use barstream::domain::num::{DoubleFactory, NumFactory};
pub use barstream::domain::ohlcv::Bar;
use barstream::domain::record::{PositionSpan, TradingRecord};
use barstream::domain::series::BarSeries;
use barstream::ports::data_port::DataPort;
use chrono::{DateTime, TimeDelta, Utc};
use std::io::Write;

/// In-memory bar and position source. Prices are stored as `f64` and
/// converted through whichever factory the caller asks for.
pub struct MockDataPort {
    pub bars: Vec<[f64; 5]>,
    pub spans: Vec<PositionSpan>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            spans: Vec::new(),
            error: None,
        }
    }

    /// One bar per close with open/high/low equal to the close.
    pub fn with_closes(mut self, closes: &[f64]) -> Self {
        self.bars
            .extend(closes.iter().map(|&c| [c, c, c, c, 1000.0]));
        self
    }

    pub fn with_ohlc(mut self, rows: &[[f64; 4]]) -> Self {
        self.bars
            .extend(rows.iter().map(|r| [r[0], r[1], r[2], r[3], 1000.0]));
        self
    }

    pub fn with_position(mut self, entry_index: usize, exit_index: Option<usize>) -> Self {
        self.spans.push(PositionSpan {
            entry_index,
            exit_index,
        });
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_bars<F: NumFactory>(&self, factory: &F) -> Result<BarSeries<F::Num>, BarstreamError> {
        if let Some(reason) = &self.error {
            return Err(BarstreamError::DataParse {
                source_name: "mock".to_string(),
                line: 0,
                reason: reason.clone(),
            });
        }
        let bars = self.bars.iter().enumerate().map(|(i, [o, h, l, c, v])| {
            Bar::from_f64(
                factory,
                minute(i as i64 + 1),
                TimeDelta::minutes(1),
                *o,
                *h,
                *l,
                *c,
                *v,
            )
        });
        Ok(BarSeries::from_bars("mock", bars))
    }

    fn load_positions(&self) -> Result<Vec<PositionSpan>, BarstreamError> {
        Ok(self.spans.clone())
    }
}

/// End of the one-minute bar with sequence number `n`.
pub fn minute(n: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(n * 60, 0).unwrap()
}

pub fn close_series(closes: &[f64]) -> BarSeries<f64> {
    MockDataPort::new()
        .with_closes(closes)
        .load_bars(&DoubleFactory)
        .unwrap()
}

/// Long-first record trading at the closes of `trades`, alternating entry
/// and exit.
pub fn long_record(series: &BarSeries<f64>, trades: &[usize]) -> TradingRecord<f64> {
    let mut record = TradingRecord::long();
    for &i in trades {
        let bar = series.bar(i).unwrap();
        record
            .operate(i, bar.end, bar.close, 1.0, &DoubleFactory)
            .unwrap();
    }
    record
}

/// Bars CSV in the on-disk format, one day per close starting 2024-01-01.
pub fn bars_csv(closes: &[f64]) -> String {
    let mut out = String::from("begin,end,open,high,low,close,volume,trades\n");
    let start = DateTime::from_timestamp(1_704_067_200, 0).unwrap();
    for (i, c) in closes.iter().enumerate() {
        let begin = start + TimeDelta::days(i as i64);
        let end = begin + TimeDelta::days(1);
        out.push_str(&format!(
            "{},{},{c},{c},{c},{c},1000,10\n",
            begin.to_rfc3339(),
            end.to_rfc3339()
        ));
    }
    out
}

pub fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Parses CSV output into rows of fields, header included.
pub fn csv_rows(output: &[u8]) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(output);
    rdr.records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}
