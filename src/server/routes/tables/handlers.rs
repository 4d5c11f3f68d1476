use super::extract::Endpoint;
use super::{resource_url, respond};
use crate::db::Predicate;
use crate::error::{WebstoreError, WebstoreResult};
use crate::formats::{TableEncoder, decode_rows};
use crate::query::translate;
use crate::server::router::WebstoreState;
use axum::{body::Bytes, extract::State, http::StatusCode, response::Response};
use serde_json::Value;
use tracing::{debug, info};
use webstore_schema::{Message, row_from_pairs};

const SQL_MEDIA_TYPE: &str = "text/sql";

/// `GET /db/{database}`: one row per table with a link to it.
pub async fn index(State(state): State<WebstoreState>, ep: Endpoint) -> Response {
    list_tables(&state, &ep)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

async fn list_tables(state: &WebstoreState, ep: &Endpoint) -> WebstoreResult<Response> {
    let db = state.factory.resolve(&ep.database).await?;
    let names = db.table_names().await?;

    let columns = ["name".to_string(), "url".to_string()];
    let mut encoder = TableEncoder::new(ep.format, &columns)?;
    for name in names {
        let url = resource_url(db.name(), &name);
        encoder.push(&row_from_pairs([
            ("name", Value::from(name)),
            ("url", Value::from(url)),
        ]))?;
    }
    Ok(respond::encoded(ep.format, encoder))
}

/// `POST /db/{database}?table=NAME`: same as the named create.
pub async fn create(State(state): State<WebstoreState>, ep: Endpoint, body: Bytes) -> Response {
    let Some(table) = ep.params.get("table").map(str::to_string) else {
        return respond::error(ep.format, WebstoreError::MissingArgument("table"));
    };
    let ep = ep.with_table(table);
    create_table(&state, &ep, &body)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

/// `POST /db/{database}/{table}`: creates a table from the posted rows.
pub async fn create_named(
    State(state): State<WebstoreState>,
    ep: Endpoint,
    body: Bytes,
) -> Response {
    create_table(&state, &ep, &body)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

async fn create_table(state: &WebstoreState, ep: &Endpoint, body: &[u8]) -> WebstoreResult<Response> {
    let db = state.factory.resolve(&ep.database).await?;
    let mut table = db.table(ep.table()?).await?;
    let url = resource_url(db.name(), table.name());
    if table.exists() {
        return Err(WebstoreError::TableAlreadyExists {
            table: table.name().to_string(),
            url,
        });
    }

    let mut written = 0usize;
    for row in decode_rows(ep.body_format()?, body)? {
        let row = row?;
        if row.is_empty() {
            continue;
        }
        table.add_row(&row).await?;
        written += 1;
    }
    if written == 0 {
        return Err(WebstoreError::MalformedBody(
            "no rows with columns to create the table from".to_string(),
        ));
    }
    table.commit().await?;

    info!(database = %db.name(), table = %table.name(), rows = written, "table created");
    let message = Message::success(
        format!("Successfully created: {}", table.name()),
        StatusCode::CREATED.as_u16(),
    )
    .with_url(Some(url));
    Ok(respond::message(ep.format, &message))
}

/// `GET /db/{database}/{table}`: filtered, sorted, paged read.
pub async fn read(State(state): State<WebstoreState>, ep: Endpoint) -> Response {
    read_table(&state, &ep)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

async fn read_table(state: &WebstoreState, ep: &Endpoint) -> WebstoreResult<Response> {
    let db = state.factory.resolve(&ep.database).await?;
    let table = db.table(ep.table()?).await?;
    if !table.exists() {
        return Err(WebstoreError::TableNotFound(table.name().to_string()));
    }

    let query = translate(&ep.params)?;
    let predicate = table.build_predicate(&query.filters)?;
    let select = table.select(&predicate, &query.sort, query.limit, query.offset)?;
    respond::table(ep.format, table.fetch(&select)).await
}

/// `GET /db/{database}/{table}/row/{n}`: the n-th row, counting from 1.
pub async fn row(State(state): State<WebstoreState>, ep: Endpoint) -> Response {
    read_row(&state, &ep)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

fn parse_ordinal(raw: &str) -> WebstoreResult<u64> {
    match raw.parse::<u64>() {
        Ok(0) => Err(WebstoreError::InvalidRowOrdinal(
            "0 (rows are numbered from 1)".to_string(),
        )),
        Ok(n) => Ok(n),
        Err(_) => Err(WebstoreError::InvalidRowOrdinal(raw.to_string())),
    }
}

async fn read_row(state: &WebstoreState, ep: &Endpoint) -> WebstoreResult<Response> {
    let db = state.factory.resolve(&ep.database).await?;
    let table = db.table(ep.table()?).await?;
    if !table.exists() {
        return Err(WebstoreError::TableNotFound(table.name().to_string()));
    }

    let ordinal = parse_ordinal(ep.row.as_deref().unwrap_or_default())?;
    // Paging parameters must be well formed even though the ordinal overrides them.
    let query = translate(&ep.params)?;
    let select = table.select(
        &Predicate::always(),
        &query.sort,
        Some(1),
        Some(ordinal - 1),
    )?;
    respond::table(ep.format, table.fetch(&select)).await
}

/// `PUT /db/{database}/{table}?unique=col`: upserts the posted rows.
pub async fn update(State(state): State<WebstoreState>, ep: Endpoint, body: Bytes) -> Response {
    update_table(&state, &ep, &body)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

async fn update_table(state: &WebstoreState, ep: &Endpoint, body: &[u8]) -> WebstoreResult<Response> {
    let unique: Vec<String> = ep.params.get_all("unique").map(str::to_string).collect();
    let db = state.factory.resolve(&ep.database).await?;
    let mut table = db.table(ep.table()?).await?;
    if !table.exists() {
        return Err(WebstoreError::TableNotFound(table.name().to_string()));
    }

    let (mut updated, mut inserted) = (0usize, 0usize);
    for row in decode_rows(ep.body_format()?, body)? {
        let row = row?;
        if row.is_empty() {
            continue;
        }
        if table.upsert_row(&unique, &row).await? {
            updated += 1;
        } else {
            inserted += 1;
        }
    }
    table.commit().await?;

    info!(
        database = %db.name(),
        table = %table.name(),
        updated,
        inserted,
        "table updated"
    );
    let message = Message::success(
        format!("Table updated: {}", table.name()),
        StatusCode::CREATED.as_u16(),
    )
    .with_url(Some(resource_url(db.name(), table.name())));
    Ok(respond::message(ep.format, &message))
}

/// `DELETE /db/{database}/{table}`.
pub async fn delete(State(state): State<WebstoreState>, ep: Endpoint) -> Response {
    drop_table(&state, &ep)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

async fn drop_table(state: &WebstoreState, ep: &Endpoint) -> WebstoreResult<Response> {
    let db = state.factory.resolve(&ep.database).await?;
    let mut table = db.table(ep.table()?).await?;
    table.drop_table().await?;
    table.commit().await?;

    info!(database = %db.name(), table = %table.name(), "table dropped");
    let message = Message::success(
        format!("Table dropped: {}", table.name()),
        StatusCode::GONE.as_u16(),
    );
    Ok(respond::message(ep.format, &message))
}

/// `PUT /db/{database}` with a `text/sql` body: runs the statement.
pub async fn sql(State(state): State<WebstoreState>, ep: Endpoint, body: Bytes) -> Response {
    run_sql(&state, &ep, &body)
        .await
        .unwrap_or_else(|e| respond::error(ep.format, e))
}

async fn run_sql(state: &WebstoreState, ep: &Endpoint, body: &[u8]) -> WebstoreResult<Response> {
    if ep.media_type().as_deref() != Some(SQL_MEDIA_TYPE) {
        return Err(WebstoreError::InvalidParameter(
            "only text/sql content is supported".to_string(),
        ));
    }
    let statement = std::str::from_utf8(body)
        .map_err(|e| WebstoreError::MalformedBody(e.to_string()))?
        .trim();
    if statement.is_empty() {
        return Err(WebstoreError::MalformedBody("empty statement".to_string()));
    }

    let db = state.factory.resolve(&ep.database).await?;
    debug!(database = %db.name(), sql = %statement, "executing raw statement");
    let cursor = db.execute_sql(statement).await?;
    respond::table(ep.format, cursor).await
}
