//! Wire formats: negotiation, table/message rendering and row decoding.
//!
//! The core only deals in [`Row`]s and [`Message`]s. This module owns the
//! bytes. Adding a format means adding a [`Format`] variant and wiring its
//! encoder and decoder into the enums below.

mod csv;
mod json;

use crate::error::{WebstoreError, WebstoreResult};
use serde::{Deserialize, Serialize};
use webstore_schema::{Message, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Csv,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Csv => "text/csv; charset=utf-8",
        }
    }

    /// Resolves an explicit path suffix such as `csv`.
    pub fn from_suffix(suffix: &str) -> WebstoreResult<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            _ => Err(WebstoreError::UnsupportedFormat(suffix.to_string())),
        }
    }

    /// Maps a media type (parameters allowed) to a format.
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/json" | "text/json" => Some(Format::Json),
            "text/csv" | "application/csv" => Some(Format::Csv),
            _ => None,
        }
    }

    /// Highest-ranked supported media type in an `Accept` header.
    ///
    /// Entries are ordered by `q` (default 1), ties keep header order.
    /// Wildcards, unsupported types and `q=0` are skipped so the caller can
    /// fall back to its default.
    pub fn from_accept(accept: &str) -> Option<Self> {
        let mut best: Option<(Self, f32)> = None;
        for item in accept.split(',') {
            let q = quality(item);
            if q <= 0.0 {
                continue;
            }
            let Some(format) = Format::from_media_type(item) else {
                continue;
            };
            if best.is_none_or(|(_, best_q)| q > best_q) {
                best = Some((format, q));
            }
        }
        best.map(|(format, _)| format)
    }

    /// Suffix first, then `Accept`, then `default`.
    pub fn negotiate(
        suffix: Option<&str>,
        accept: Option<&str>,
        default: Format,
    ) -> WebstoreResult<Self> {
        if let Some(suffix) = suffix {
            return Format::from_suffix(suffix);
        }
        Ok(accept.and_then(Format::from_accept).unwrap_or(default))
    }
}

fn quality(item: &str) -> f32 {
    item.split(';')
        .skip(1)
        .find_map(|param| {
            param
                .trim()
                .strip_prefix("q=")
                .map(|q| q.trim().parse::<f32>().unwrap_or(0.0))
        })
        .unwrap_or(1.0)
}

/// Splits a trailing `.format` off a path segment.
pub fn split_suffix(segment: &str) -> (&str, Option<&str>) {
    match segment.rsplit_once('.') {
        Some((name, suffix)) if !name.is_empty() => (name, Some(suffix)),
        _ => (segment, None),
    }
}

/// Incremental table renderer: header on construction, one row per push.
pub enum TableEncoder {
    Json(json::JsonTable),
    Csv(csv::CsvTable),
}

impl TableEncoder {
    pub fn new(format: Format, columns: &[String]) -> WebstoreResult<Self> {
        Ok(match format {
            Format::Json => TableEncoder::Json(json::JsonTable::new(columns)?),
            Format::Csv => TableEncoder::Csv(csv::CsvTable::new(columns)),
        })
    }

    pub fn push(&mut self, row: &Row) -> WebstoreResult<()> {
        match self {
            TableEncoder::Json(t) => t.push(row),
            TableEncoder::Csv(t) => {
                t.push(row);
                Ok(())
            }
        }
    }

    pub fn finish(self) -> Vec<u8> {
        match self {
            TableEncoder::Json(t) => t.finish(),
            TableEncoder::Csv(t) => t.finish(),
        }
    }
}

pub fn render_message(format: Format, message: &Message) -> WebstoreResult<Vec<u8>> {
    match format {
        Format::Json => Ok(serde_json::to_vec(message)?),
        Format::Csv => Ok(csv::render_message(message)),
    }
}

/// Rows decoded from a request body, yielded one at a time.
pub enum RowReader<'a> {
    Json(std::vec::IntoIter<Row>),
    Csv(csv::CsvRows<'a>),
}

impl Iterator for RowReader<'_> {
    type Item = WebstoreResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RowReader::Json(rows) => rows.next().map(Ok),
            RowReader::Csv(rows) => rows.next(),
        }
    }
}

pub fn decode_rows(format: Format, body: &[u8]) -> WebstoreResult<RowReader<'_>> {
    match format {
        Format::Json => Ok(RowReader::Json(json::decode_rows(body)?.into_iter())),
        Format::Csv => Ok(RowReader::Csv(csv::CsvRows::new(body)?)),
    }
}
