//! Aggregation and popularity reporting: the per-product summary table and
//! top-N rankings by scope, plus monthly trends and report export.

pub mod ranking;
pub mod report;
pub mod summary;
pub mod trends;

pub use ranking::{top_n, top_n_for};
pub use report::{export_csv, export_json, PopularItemsReport};
pub use summary::build_summary;
pub use trends::{monthly_trends, TrendTable};
