//! Translation of queries into store requests.

mod queries;
mod query_translator;

pub use queries::{build_aggregations, build_filter, build_ids_query};
pub use query_translator::{QueryTranslator, RequestParams, SearchRequest};
pub(crate) use query_translator::as_millis;
