//! Catalog summary shown on the home page

use serde::Serialize;
use utoipa::ToSchema;

/// Aggregate counts over the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies whose status is `available`
    pub num_instances_available: i64,
    pub num_authors: i64,
}

/// Home page context: catalog counts plus this session's visit number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogSummary {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    pub num_visits: i64,
}
