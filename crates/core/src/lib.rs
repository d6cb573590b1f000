pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod validation;
mod xlsx_reader;

pub use config::AppConfig;
pub use error::{RetailError, RetailResult};
pub use store::{DatasetDescription, RawTransaction, TransactionStore};
pub use types::{
    normalize, GroupKey, ProductSummary, RankingEntry, RankingScope, RankingView, SummaryTable,
    Transaction,
};
