use crate::db::RowCursor;
use crate::error::{WebstoreError, WebstoreResult};
use crate::formats::{Format, TableEncoder, render_message};
use axum::{
    http::{HeaderValue, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use webstore_schema::Message;

fn with_format(format: Format, status: StatusCode, body: Vec<u8>) -> Response {
    let mut resp = (status, body).into_response();
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    resp
}

/// Renders a status message. The HTTP status mirrors `message.code`.
pub fn message(format: Format, message: &Message) -> Response {
    let status = StatusCode::from_u16(message.code).unwrap_or(StatusCode::OK);
    match render_message(format, message) {
        Ok(body) => with_format(format, status, body),
        Err(e) => e.into_response(),
    }
}

/// Renders a failure as an error message in the negotiated format.
pub fn error(format: Format, err: WebstoreError) -> Response {
    let status = err.status();
    let body = Message::error(err.public_message(), status.as_u16())
        .with_url(err.url().map(str::to_string));
    match render_message(format, &body) {
        Ok(bytes) => with_format(format, status, bytes),
        Err(_) => err.into_response(),
    }
}

/// Drains a cursor into a table payload.
pub async fn table(format: Format, mut cursor: RowCursor<'_>) -> WebstoreResult<Response> {
    let mut encoder = TableEncoder::new(format, cursor.columns())?;
    while let Some(row) = cursor.try_next().await? {
        encoder.push(&row)?;
    }
    Ok(with_format(format, StatusCode::OK, encoder.finish()))
}

/// Renders an already materialised table payload.
pub fn encoded(format: Format, encoder: TableEncoder) -> Response {
    with_format(format, StatusCode::OK, encoder.finish())
}
