use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use boll_core::common::enums::BAR_FIELDS;
use boll_core::common::time::parse_timestamp;
use boll_core::{BollException, BollResult, ErrCode, KLineList, KLineUnit};
use csv::ReaderBuilder;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// CSV files directly under `path`, or `path` itself when it is a file
pub fn collect_inputs(path: &Path) -> BollResult<Vec<PathBuf>> {
    if !path.exists() {
        return Err(BollException::new(
            format!("{} does not exist", path.display()),
            ErrCode::SrcDataNotFound,
        ));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path).map_err(|e| io_err(path, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let p = entry.map_err(|e| io_err(path, e))?.path();
        if p.extension().and_then(|s| s.to_str()) == Some("csv") {
            files.push(p);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(BollException::new(
            format!("no csv files in {}", path.display()),
            ErrCode::SrcDataNotFound,
        ));
    }
    Ok(files)
}

pub fn load_csv_file(path: &Path, strict: bool) -> BollResult<KLineList> {
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    debug!(path = %path.display(), "loading bars");
    load_csv(file, strict)
}

/// Read `timestamp,open,high,low,close,volume` rows and sort them by time.
///
/// With `strict` every bar must pass [`KLineUnit::check`] without repair;
/// otherwise rows are taken as-is and non-finite closes reach the calculator.
pub fn load_csv<R: Read>(reader: R, strict: bool) -> BollResult<KLineList> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().map_err(|e| {
        BollException::new(format!("header: {}", e), ErrCode::SrcDataFormatError)
    })?;
    if let Some(missing) = BAR_FIELDS.iter().copied().find(|f| !headers.iter().any(|h| h == *f)) {
        return Err(BollException::new(
            format!("missing column '{}'", missing),
            ErrCode::SrcDataFormatError,
        ));
    }

    let mut klus = Vec::new();

    for (row, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = result.map_err(|e| {
            BollException::new(format!("row {}: {}", row + 1, e), ErrCode::SrcDataFormatError)
        })?;

        let mut klu = KLineUnit::new(
            parse_timestamp(&record.timestamp)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        );
        if strict {
            klu.check(false)?;
        } else if !klu.is_finite() {
            warn!(row = row + 1, ts = klu.timestamp, "non-finite value in bar");
        }
        klus.push(klu);
    }

    if klus.is_empty() {
        return Err(BollException::new("csv holds no bars", ErrCode::NoData));
    }

    Ok(KLineList::from_unsorted(klus))
}

fn io_err(path: &Path, e: std::io::Error) -> BollException {
    BollException::new(
        format!("{}: {}", path.display(), e),
        ErrCode::SrcDataNotFound,
    )
}
