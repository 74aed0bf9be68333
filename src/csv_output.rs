use chrono::{NaiveDate, NaiveDateTime};
use csv::{Writer, WriterBuilder};
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::GeneratorError;
use crate::universe::{EventKind, Stock};

/// Placeholder in an output path replaced by the session date.
pub const DAY_TOKEN: &str = "YYYYMMDD";

pub const HEADER: [&str; 12] = [
    "date", "arrTm", "ticker", "type", "bidPx", "bidSz", "askPx", "askSz", "quotTm", "trdPx", "trdSz", "trdTm",
];

const DATE_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%H%M%S%.3f";

fn fixed_price<S: Serializer>(price: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match price {
        Some(px) => serializer.serialize_str(&format!("{:.6}", px)),
        None => serializer.serialize_none(),
    }
}

fn format_time(time: Option<NaiveDateTime>) -> Option<String> {
    time.map(|t| t.format(TIME_FORMAT).to_string())
}

/// One CSV row. Quote rows leave the trade columns empty and vice versa.
#[derive(Debug, Serialize)]
pub struct TaqRecord {
    pub date: String,
    pub arrival_time: String,
    pub ticker: String,
    pub event_type: &'static str,
    #[serde(serialize_with = "fixed_price")]
    pub bid_price: Option<f64>,
    pub bid_size: Option<u64>,
    #[serde(serialize_with = "fixed_price")]
    pub ask_price: Option<f64>,
    pub ask_size: Option<u64>,
    pub quote_time: Option<String>,
    #[serde(serialize_with = "fixed_price")]
    pub trade_price: Option<f64>,
    pub trade_size: Option<u64>,
    pub trade_time: Option<String>,
}

impl TaqRecord {
    /// Snapshot of the stock's latest event, if it has produced one.
    pub fn from_stock(stock: &Stock) -> Option<Self> {
        let kind = stock.last_event?;
        let arrival = stock.last_arrival_time?;

        let mut record = TaqRecord {
            date: arrival.format(DATE_FORMAT).to_string(),
            arrival_time: arrival.format(TIME_FORMAT).to_string(),
            ticker: stock.name.clone(),
            event_type: kind.code(),
            bid_price: None,
            bid_size: None,
            ask_price: None,
            ask_size: None,
            quote_time: None,
            trade_price: None,
            trade_size: None,
            trade_time: None,
        };

        match kind {
            EventKind::Quote => {
                record.bid_price = Some(stock.last_bid_price);
                record.bid_size = Some(stock.last_bid_size);
                record.ask_price = Some(stock.last_ask_price);
                record.ask_size = Some(stock.last_ask_size);
                record.quote_time = format_time(stock.last_quote_time);
            }
            EventKind::Trade => {
                record.trade_price = Some(stock.last_trade_price);
                record.trade_size = Some(stock.last_trade_size);
                record.trade_time = format_time(stock.last_trade_time);
            }
        }
        Some(record)
    }
}

/// Where generated rows go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
    /// Path template containing [`DAY_TOKEN`]; one file per session.
    Daily(String),
}

impl OutputTarget {
    pub fn from_path(path: Option<&str>) -> Self {
        match path {
            None | Some("-") => OutputTarget::Stdout,
            Some(p) if p.contains(DAY_TOKEN) => OutputTarget::Daily(p.to_string()),
            Some(p) => OutputTarget::File(PathBuf::from(p)),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> Option<PathBuf> {
        match self {
            OutputTarget::Stdout => None,
            OutputTarget::File(path) => Some(path.clone()),
            OutputTarget::Daily(template) => Some(PathBuf::from(
                template.replace(DAY_TOKEN, &date.format(DATE_FORMAT).to_string()),
            )),
        }
    }
}

type RowWriter = Writer<Box<dyn Write + Send>>;

/// CSV event emitter with per-day file rotation.
pub struct TaqSink {
    target: OutputTarget,
    writer: RowWriter,
    current_path: PathBuf,
    files_opened: usize,
    rows: u64,
}

impl TaqSink {
    pub fn open(target: OutputTarget, first_date: NaiveDate) -> Result<Self, GeneratorError> {
        let (writer, current_path) = Self::open_writer(&target, first_date)?;
        let files_opened = usize::from(target != OutputTarget::Stdout);
        Ok(Self {
            target,
            writer,
            current_path,
            files_opened,
            rows: 0,
        })
    }

    fn open_writer(target: &OutputTarget, date: NaiveDate) -> Result<(RowWriter, PathBuf), GeneratorError> {
        let (inner, path): (Box<dyn Write + Send>, PathBuf) = match target.path_for(date) {
            None => (Box::new(io::stdout()), PathBuf::from("<stdout>")),
            Some(path) => {
                let file = File::create(&path).map_err(|source| GeneratorError::Output {
                    path: path.clone(),
                    source,
                })?;
                info!("Writing events to {}", path.display());
                (Box::new(BufWriter::new(file)), path)
            }
        };

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(HEADER)?;
        Ok((writer, path))
    }

    /// Starts the file for `date` when writing one file per session.
    pub fn rotate(&mut self, date: NaiveDate) -> Result<(), GeneratorError> {
        if !matches!(self.target, OutputTarget::Daily(_)) {
            return Ok(());
        }
        self.flush()?;
        debug!("Closing {} after {} rows", self.current_path.display(), self.rows);

        let (writer, path) = Self::open_writer(&self.target, date)?;
        self.writer = writer;
        self.current_path = path;
        self.files_opened += 1;
        self.rows = 0;
        Ok(())
    }

    pub fn write(&mut self, stock: &Stock) -> Result<(), GeneratorError> {
        if let Some(record) = TaqRecord::from_stock(stock) {
            self.writer.serialize(&record)?;
            self.rows += 1;
        }
        Ok(())
    }

    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    fn flush(&mut self) -> Result<(), GeneratorError> {
        self.writer.flush().map_err(|source| GeneratorError::Output {
            path: self.current_path.clone(),
            source,
        })
    }

    /// Flushes the open file and returns how many files were written.
    pub fn finish(mut self) -> Result<usize, GeneratorError> {
        self.flush()?;
        Ok(self.files_opened)
    }
}
