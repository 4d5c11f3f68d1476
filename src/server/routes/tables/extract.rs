use super::respond;
use crate::error::{WebstoreError, WebstoreResult};
use crate::formats::{Format, split_suffix};
use crate::query::QueryParams;
use crate::server::router::WebstoreState;
use axum::{
    extract::{FromRequestParts, Path},
    http::{
        HeaderName,
        header::{ACCEPT, CONTENT_TYPE},
        request::Parts,
    },
    response::Response,
};
use tracing::debug;

/// Everything a table route needs from the request line and headers.
///
/// The `.fmt` suffix is split off whichever path parameter comes last, so
/// `/db/main.csv`, `/db/main/t.csv` and `/db/main/t/row/1.csv` all work.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub database: String,
    pub table: Option<String>,
    pub row: Option<String>,
    /// Negotiated response format.
    pub format: Format,
    /// Format named by the path suffix, if any.
    pub suffix_format: Option<Format>,
    pub content_type: Option<String>,
    pub params: QueryParams,
    default_format: Format,
}

impl Endpoint {
    /// Table name, for routes that carry one.
    pub fn table(&self) -> WebstoreResult<&str> {
        self.table
            .as_deref()
            .ok_or(WebstoreError::MissingArgument("table"))
    }

    /// Same endpoint addressing `table`.
    pub fn with_table(self, table: String) -> Self {
        Self {
            table: Some(table),
            ..self
        }
    }

    /// Format of the request body: path suffix, then `Content-Type`, then the
    /// configured default.
    pub fn body_format(&self) -> WebstoreResult<Format> {
        if let Some(format) = self.suffix_format {
            return Ok(format);
        }
        match self.content_type.as_deref() {
            None => Ok(self.default_format),
            Some(media_type) => Format::from_media_type(media_type)
                .ok_or_else(|| WebstoreError::UnsupportedFormat(media_type.to_string())),
        }
    }

    /// Essence of the `Content-Type` header, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|essence| essence.trim().to_ascii_lowercase())
    }
}

impl FromRequestParts<WebstoreState> for Endpoint {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &WebstoreState,
    ) -> Result<Self, Self::Rejection> {
        let default_format = state.default_format;

        let Path(mut segments) = Path::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection, "path rejected");
                respond::error(
                    default_format,
                    WebstoreError::InvalidParameter(rejection.body_text()),
                )
            })?;

        let mut suffix = None;
        if let Some((_, last)) = segments.last_mut() {
            let (value, fmt) = split_suffix(last);
            if let Some(fmt) = fmt {
                suffix = Some(fmt.to_string());
                *last = value.to_string();
            }
        }

        let header = |name: HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let accept = header(ACCEPT);
        let content_type = header(CONTENT_TYPE);

        let format = Format::negotiate(suffix.as_deref(), accept.as_deref(), default_format)
            .map_err(|e| respond::error(default_format, e))?;
        let suffix_format = suffix.is_some().then_some(format);

        let mut database = None;
        let mut table = None;
        let mut row = None;
        for (key, value) in segments {
            match key.as_str() {
                "database" => database = Some(value),
                "table" => table = Some(value),
                "row" => row = Some(value),
                _ => {}
            }
        }
        let database = database.ok_or_else(|| {
            respond::error(format, WebstoreError::MissingArgument("database"))
        })?;

        Ok(Endpoint {
            database,
            table,
            row,
            format,
            suffix_format,
            content_type,
            params: QueryParams::parse(parts.uri.query()),
            default_format,
        })
    }
}
