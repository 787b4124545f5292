//! Mapping of store responses into typed results.

mod response;
mod result_mapper;

pub use response::{
    RawCountResponse, RawGetResponse, RawHit, RawHits, RawSearchResponse, RawTotal,
    RawWriteResponse,
};
pub use result_mapper::{PageRequest, ResultMapper};
