//! Query translation: turns an open-ended query string into paging, ordering
//! and a residue of filter candidates for the table gateway.

mod params;
mod translate;

pub use params::QueryParams;
pub use translate::{Direction, LIMIT_KEY, OFFSET_KEY, ReadQuery, SORT_KEY, SortKey, translate};
