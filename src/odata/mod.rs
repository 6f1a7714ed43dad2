//! OData URL conventions used by the tool layer and the request gateway.

pub mod pagination;
pub mod query;

pub use pagination::PaginationContinuation;
pub use query::QueryOptions;
