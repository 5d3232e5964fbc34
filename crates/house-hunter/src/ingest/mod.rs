//! Loaders that turn external data (CSV exports, realtor API payloads) into
//! [`Listing`](crate::underwriting::Listing) and [`RentalComp`](crate::underwriting::RentalComp) records.

pub mod csv;
pub mod realtor;

use std::fmt;

#[derive(Debug)]
pub enum IngestError {
    Io(std::io::Error),
    Csv(::csv::Error),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Io(err) => write!(f, "failed to read input file: {}", err),
            IngestError::Csv(err) => write!(f, "invalid CSV data: {}", err),
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Io(err) => Some(err),
            IngestError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<::csv::Error> for IngestError {
    fn from(err: ::csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Lenient numeric parsing: blanks and garbage become `None`; `$` and `,` are ignored.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, '$' | ','))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub(crate) fn parse_year(raw: &str) -> Option<i32> {
    parse_amount(raw)
        .map(|value| value.trunc())
        .filter(|value| (1.0..=9999.0).contains(value))
        .map(|value| value as i32)
}
