//! Product recommendations. Resolves a free-text product query against the
//! per-product summary table into related products.

pub mod recommendations;

pub use recommendations::{
    recommend, sort_results, RecommendationEngine, RecommendationRequest, RecommendationResponse,
    SortOrder,
};
