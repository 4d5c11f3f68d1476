use super::params::QueryParams;
use crate::error::{WebstoreError, WebstoreResult};

pub const LIMIT_KEY: &str = "_limit";
pub const OFFSET_KEY: &str = "_offset";
pub const SORT_KEY: &str = "_sort";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    /// Case-insensitive. Anything other than `desc` sorts ascending.
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("desc") {
            Direction::Descending
        } else {
            Direction::Ascending
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

impl SortKey {
    /// Parses `direction:column`, splitting at the first `:`.
    pub fn parse(raw: &str) -> WebstoreResult<Self> {
        let Some((direction, column)) = raw.split_once(':') else {
            return Err(WebstoreError::InvalidParameter(format!(
                "{raw} (invalid sorting format, use: order:column)"
            )));
        };
        if column.is_empty() {
            return Err(WebstoreError::InvalidParameter(format!(
                "{raw} (sort column is empty)"
            )));
        }
        Ok(Self {
            column: column.to_string(),
            direction: Direction::from_token(direction),
        })
    }
}

/// Paging, ordering and the filter residue of one read request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadQuery {
    pub filters: QueryParams,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sort: Vec<SortKey>,
}

/// Pulls the control parameters out of `params`.
///
/// Column names are not checked here; the remaining parameters are handed to
/// the table gateway, which owns the schema.
pub fn translate(params: &QueryParams) -> WebstoreResult<ReadQuery> {
    let (limits, rest) = params.split_off(LIMIT_KEY);
    let (offsets, rest) = rest.split_off(OFFSET_KEY);
    let (sorts, filters) = rest.split_off(SORT_KEY);

    let limit = limits.first().map(|v| parse_count(v)).transpose()?;
    let offset = offsets.first().map(|v| parse_count(v)).transpose()?;
    let sort = sorts
        .iter()
        .map(|raw| SortKey::parse(raw))
        .collect::<WebstoreResult<Vec<_>>>()?;

    Ok(ReadQuery {
        filters,
        limit,
        offset,
        sort,
    })
}

fn parse_count(raw: &str) -> WebstoreResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| WebstoreError::InvalidParameter(format!("{raw} ({e})")))
}
